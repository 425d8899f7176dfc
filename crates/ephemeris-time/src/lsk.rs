//! NAIF leapseconds-kernel (LSK) text parser.
//!
//! An LSK is a text kernel whose `\begindata` blocks assign the
//! `DELTET/*` variables driving UTC ↔ TDB conversion. The format is
//! described in the NAIF Time Required Reading; this parser tokenizes
//! the data blocks and reads variable assignments off the token
//! stream, which copes with arrays split across continuation lines
//! without any line-shape assumptions.

use std::collections::HashMap;

use crate::error::TimeError;
use crate::julian::{calendar_to_jd, jd_to_tdb_seconds, month_from_abbrev};

/// The `DELTET/*` variables of a leapseconds kernel.
#[derive(Debug, Clone)]
pub struct LskData {
    /// TT − TAI in seconds (`DELTET/DELTA_T_A`).
    pub delta_t_a: f64,
    /// Amplitude of the periodic TDB − TT term, seconds (`DELTET/K`).
    pub k: f64,
    /// Eccentricity used in that term's Kepler step (`DELTET/EB`).
    pub eb: f64,
    /// Earth mean anomaly at J2000.0, radians (`DELTET/M(1)`).
    pub m0: f64,
    /// Earth mean anomaly rate, rad/s (`DELTET/M(2)`).
    pub m1: f64,
    /// `(ΔAT, effective-from epoch as TDB-ish seconds past J2000)`
    /// pairs in file order (`DELTET/DELTA_AT`).
    pub leap_seconds: Vec<(f64, f64)>,
}

/// Parse LSK text into its `DELTET/*` variables.
pub fn parse_lsk(content: &str) -> Result<LskData, TimeError> {
    let vars = read_assignments(&tokenize(content)?)?;

    let scalar = |name: &str| -> Result<f64, TimeError> {
        vars.get(name)
            .and_then(|v| v.first())
            .copied()
            .ok_or_else(|| TimeError::LskParse(format!("missing scalar {name}")))
    };

    let m = vars
        .get("DELTET/M")
        .filter(|v| v.len() >= 2)
        .ok_or_else(|| TimeError::LskParse("DELTET/M must carry two values".into()))?;

    let delta_at = vars
        .get("DELTET/DELTA_AT")
        .ok_or_else(|| TimeError::LskParse("missing DELTET/DELTA_AT".into()))?;
    if delta_at.is_empty() || delta_at.len() % 2 != 0 {
        return Err(TimeError::LskParse(
            "DELTET/DELTA_AT must be non-empty (ΔAT, epoch) pairs".into(),
        ));
    }

    Ok(LskData {
        delta_t_a: scalar("DELTET/DELTA_T_A")?,
        k: scalar("DELTET/K")?,
        eb: scalar("DELTET/EB")?,
        m0: m[0],
        m1: m[1],
        leap_seconds: delta_at.chunks_exact(2).map(|p| (p[0], p[1])).collect(),
    })
}

#[derive(Debug, PartialEq)]
enum Token {
    Name(String),
    Equals,
    Open,
    Close,
    Number(f64),
}

/// Tokenize the `\begindata` blocks. Comment text outside the blocks
/// is ignored entirely.
fn tokenize(content: &str) -> Result<Vec<Token>, TimeError> {
    let mut tokens = Vec::new();
    let mut in_data = false;

    for line in content.lines() {
        let line = line.trim();
        if line.eq_ignore_ascii_case("\\begindata") {
            in_data = true;
            continue;
        }
        if line.eq_ignore_ascii_case("\\begintext") {
            in_data = false;
            continue;
        }
        if !in_data {
            continue;
        }
        for word in line.split([' ', '\t', ',']).filter(|w| !w.is_empty()) {
            push_word(word, &mut tokens)?;
        }
    }

    if tokens.is_empty() {
        return Err(TimeError::LskParse("no \\begindata section found".into()));
    }
    Ok(tokens)
}

/// Split one whitespace-delimited word into tokens, peeling any
/// parentheses or `=` glued onto it.
fn push_word(word: &str, out: &mut Vec<Token>) -> Result<(), TimeError> {
    if let Some((lhs, rhs)) = word.split_once('=') {
        if !lhs.is_empty() {
            push_word(lhs, out)?;
        }
        out.push(Token::Equals);
        if !rhs.is_empty() {
            push_word(rhs, out)?;
        }
        return Ok(());
    }

    let mut body = word;
    while let Some(rest) = body.strip_prefix('(') {
        out.push(Token::Open);
        body = rest;
    }
    let mut trailing_closes = 0;
    while let Some(rest) = body.strip_suffix(')') {
        trailing_closes += 1;
        body = rest;
    }
    if !body.is_empty() {
        out.push(atom(body)?);
    }
    out.extend(std::iter::repeat_with(|| Token::Close).take(trailing_closes));
    Ok(())
}

fn atom(body: &str) -> Result<Token, TimeError> {
    if let Some(date) = body.strip_prefix('@') {
        return Ok(Token::Number(naif_epoch_seconds(date)?));
    }
    // Numbers may use Fortran exponent notation (1.657D-3).
    let first = body.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() || matches!(first, '-' | '+' | '.') {
        let normalized = body.replace(['D', 'd'], "E");
        let value = normalized
            .parse()
            .map_err(|_| TimeError::LskParse(format!("bad numeric token '{body}'")))?;
        return Ok(Token::Number(value));
    }
    Ok(Token::Name(body.to_string()))
}

/// `@1972-JAN-1` style date literal to seconds past J2000.
fn naif_epoch_seconds(date: &str) -> Result<f64, TimeError> {
    let mut parts = date.split('-');
    let (Some(y), Some(mon), Some(d), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimeError::LskParse(format!("bad date literal @{date}")));
    };
    let year: i32 = y
        .parse()
        .map_err(|_| TimeError::LskParse(format!("bad year in @{date}")))?;
    let month = month_from_abbrev(mon)
        .ok_or_else(|| TimeError::LskParse(format!("bad month in @{date}")))?;
    let day: f64 = d
        .parse()
        .map_err(|_| TimeError::LskParse(format!("bad day in @{date}")))?;
    Ok(jd_to_tdb_seconds(calendar_to_jd(year, month, day)))
}

/// Walk the token stream as a sequence of `NAME = value-or-array`
/// assignments.
fn read_assignments(tokens: &[Token]) -> Result<HashMap<String, Vec<f64>>, TimeError> {
    let mut vars = HashMap::new();
    let mut cursor = tokens.iter();

    while let Some(token) = cursor.next() {
        let Token::Name(name) = token else {
            return Err(TimeError::LskParse(format!("expected a variable name, found {token:?}")));
        };
        if cursor.next() != Some(&Token::Equals) {
            return Err(TimeError::LskParse(format!("{name} is not followed by '='")));
        }

        let values = match cursor.next() {
            Some(Token::Number(n)) => vec![*n],
            Some(Token::Open) => {
                let mut values = Vec::new();
                loop {
                    match cursor.next() {
                        Some(Token::Number(n)) => values.push(*n),
                        Some(Token::Close) => break,
                        other => {
                            return Err(TimeError::LskParse(format!(
                                "unterminated array for {name}: found {other:?}"
                            )));
                        }
                    }
                }
                values
            }
            other => {
                return Err(TimeError::LskParse(format!("{name} has no value: found {other:?}")));
            }
        };
        vars.insert(name.clone(), values);
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNEL_TEXT: &str = r#"
KPL/LSK

Commentary that the parser must skip, = signs ( and parens ) included.

\begindata

DELTET/DELTA_T_A = 32.184
DELTET/K         = 1.657D-3
DELTET/EB        = 1.671D-2
DELTET/M         = ( 6.239996 1.99096871D-7 )

DELTET/DELTA_AT  = ( 10, @1972-JAN-1
                     11, @1972-JUL-1
                     12, @1973-JAN-1
                     37, @2017-JAN-1 )

\begintext
"#;

    #[test]
    fn reads_all_deltet_variables() {
        let data = parse_lsk(KERNEL_TEXT).unwrap();
        assert!((data.delta_t_a - 32.184).abs() < 1e-12);
        assert!((data.k - 1.657e-3).abs() < 1e-15);
        assert!((data.eb - 1.671e-2).abs() < 1e-15);
        assert!((data.m0 - 6.239996).abs() < 1e-12);
        assert!((data.m1 - 1.99096871e-7).abs() < 1e-18);
        assert_eq!(data.leap_seconds.len(), 4);
        assert_eq!(data.leap_seconds[0].0, 10.0);
        assert_eq!(data.leap_seconds[3].0, 37.0);
    }

    #[test]
    fn leap_epochs_land_on_the_right_julian_dates() {
        let data = parse_lsk(KERNEL_TEXT).unwrap();
        // 1972-01-01 is JD 2441317.5; 2017-01-01 is JD 2457754.5.
        let s_1972 = (2_441_317.5 - 2_451_545.0) * 86_400.0;
        let s_2017 = (2_457_754.5 - 2_451_545.0) * 86_400.0;
        assert!((data.leap_seconds[0].1 - s_1972).abs() < 1.0);
        assert!((data.leap_seconds[3].1 - s_2017).abs() < 1.0);
    }

    #[test]
    fn glued_punctuation_tokenizes() {
        let text = "\\begindata\nDELTET/DELTA_T_A=32.184\nDELTET/K=(1.0)\n";
        let tokens = tokenize(text).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("DELTET/DELTA_T_A".into()),
                Token::Equals,
                Token::Number(32.184),
                Token::Name("DELTET/K".into()),
                Token::Equals,
                Token::Open,
                Token::Number(1.0),
                Token::Close,
            ]
        );
    }

    #[test]
    fn missing_data_section_is_an_error() {
        let err = parse_lsk("just commentary, no data").unwrap_err();
        assert!(matches!(err, TimeError::LskParse(_)));
    }

    #[test]
    fn odd_delta_at_length_is_rejected() {
        let text = "\\begindata
DELTET/DELTA_T_A = 32.184
DELTET/K = 1.657D-3
DELTET/EB = 1.671D-2
DELTET/M = ( 6.239996 1.99096871D-7 )
DELTET/DELTA_AT = ( 10, @1972-JAN-1, 11 )
";
        let err = parse_lsk(text).unwrap_err();
        assert!(matches!(err, TimeError::LskParse(_)));
    }

    #[test]
    fn unterminated_array_is_rejected() {
        let text = "\\begindata\nDELTET/M = ( 6.239996 1.99096871D-7\n";
        let err = parse_lsk(text).unwrap_err();
        assert!(matches!(err, TimeError::LskParse(_)));
    }

    #[test]
    fn bad_month_abbreviation_is_rejected() {
        let text = "\\begindata\nDELTET/DELTA_AT = ( 10, @1972-SMARCH-1 )\n";
        let err = parse_lsk(text).unwrap_err();
        assert!(matches!(err, TimeError::LskParse(_)));
    }
}
