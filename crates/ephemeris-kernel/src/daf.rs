//! NAIF DAF (Double precision Array File) binary record reader.
//!
//! A DAF file is a sequence of 1024-byte records: one file record, a chain
//! of summary/name record pairs, then the raw double-precision data the
//! summaries point into. This module reads the generic DAF envelope; `spk`
//! interprets the summaries as SPK segment descriptors.
//!
//! Format reference: NAIF SPICE "DAF Required Reading" (public domain,
//! US Government work product).

use crate::error::KernelError;

const RECORD_LEN: usize = 1024;
const DOUBLES_PER_RECORD: usize = RECORD_LEN / 8;

/// Parsed DAF file record (the first 1024 bytes of the file).
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub locidw: String,
    pub nd: usize,
    pub ni: usize,
    pub fward: usize,
    pub bward: usize,
}

/// One summary entry: `nd` doubles followed by `ni` packed i32s.
#[derive(Debug, Clone)]
pub struct Summary {
    pub doubles: Vec<f64>,
    pub ints: Vec<i32>,
}

/// A DAF file loaded fully into memory, with its summaries parsed.
#[derive(Debug)]
pub struct DafFile {
    bytes: Vec<u8>,
    pub file_record: FileRecord,
    pub summaries: Vec<Summary>,
}

impl DafFile {
    pub fn parse(bytes: Vec<u8>) -> Result<Self, KernelError> {
        if bytes.len() < RECORD_LEN {
            return Err(KernelError::BadFormat("file shorter than one DAF record".into()));
        }
        let file_record = parse_file_record(&bytes[..RECORD_LEN])?;
        let summaries = parse_summaries(&bytes, &file_record)?;
        Ok(Self { bytes, file_record, summaries })
    }

    /// Read `count` consecutive doubles starting at a 1-based DAF word
    /// address (the addressing convention used by summary start/end addrs).
    pub fn read_doubles(&self, start_word_addr: usize, count: usize) -> Result<Vec<f64>, KernelError> {
        let byte_offset = (start_word_addr - 1) * 8;
        let end = byte_offset + count * 8;
        if end > self.bytes.len() {
            return Err(KernelError::BadFormat(format!(
                "segment data read out of bounds: offset {byte_offset}, len {count}"
            )));
        }
        Ok(self.bytes[byte_offset..end]
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }
}

fn parse_file_record(rec: &[u8]) -> Result<FileRecord, KernelError> {
    let locidw = String::from_utf8_lossy(&rec[0..8]).trim_end().to_string();
    if !locidw.starts_with("DAF/") {
        return Err(KernelError::BadFormat(format!("unexpected LOCIDW: {locidw:?}")));
    }
    let nd = i32::from_le_bytes(rec[8..12].try_into().unwrap()) as usize;
    let ni = i32::from_le_bytes(rec[12..16].try_into().unwrap()) as usize;
    let fward = i32::from_le_bytes(rec[76..80].try_into().unwrap()) as usize;
    let bward = i32::from_le_bytes(rec[80..84].try_into().unwrap()) as usize;
    let locfmt = String::from_utf8_lossy(&rec[88..96]).trim_end().to_string();
    if locfmt != "LTL-IEEE" {
        return Err(KernelError::BadFormat(format!(
            "unsupported byte order/format: {locfmt:?} (only LTL-IEEE is supported)"
        )));
    }
    Ok(FileRecord { locidw, nd, ni, fward, bward })
}

/// Words per summary entry: ND doubles + NI ints packed two per double-word.
fn summary_size_words(nd: usize, ni: usize) -> usize {
    nd + (ni + 1) / 2
}

fn parse_summaries(bytes: &[u8], file_record: &FileRecord) -> Result<Vec<Summary>, KernelError> {
    let ss = summary_size_words(file_record.nd, file_record.ni);
    let mut summaries = Vec::new();
    let mut record_no = file_record.fward;

    while record_no != 0 {
        let rec_offset = (record_no - 1) * RECORD_LEN;
        if rec_offset + RECORD_LEN > bytes.len() {
            return Err(KernelError::BadFormat("summary record out of bounds".into()));
        }
        let rec = &bytes[rec_offset..rec_offset + RECORD_LEN];
        let words: Vec<f64> = rec
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        debug_assert_eq!(words.len(), DOUBLES_PER_RECORD);

        let next = words[0] as usize;
        let nsum = words[2].round() as usize;

        let mut offset = 3;
        for _ in 0..nsum {
            let doubles = words[offset..offset + file_record.nd].to_vec();
            let int_words = &words[offset + file_record.nd..offset + ss];
            let mut ints = Vec::with_capacity(file_record.ni);
            for w in int_words {
                let bits = w.to_le_bytes();
                let a = i32::from_le_bytes(bits[0..4].try_into().unwrap());
                let b = i32::from_le_bytes(bits[4..8].try_into().unwrap());
                ints.push(a);
                if ints.len() < file_record.ni {
                    ints.push(b);
                }
            }
            ints.truncate(file_record.ni);
            summaries.push(Summary { doubles, ints });
            offset += ss;
        }

        record_no = next;
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_daf(nd: usize, ni: usize, summaries: &[(Vec<f64>, Vec<i32>)]) -> Vec<u8> {
        let ss = summary_size_words(nd, ni);
        let mut file = vec![0u8; RECORD_LEN * 2];

        file[0..8].copy_from_slice(b"DAF/SPK ");
        file[8..12].copy_from_slice(&(nd as i32).to_le_bytes());
        file[12..16].copy_from_slice(&(ni as i32).to_le_bytes());
        file[76..80].copy_from_slice(&2i32.to_le_bytes()); // fward
        file[80..84].copy_from_slice(&2i32.to_le_bytes()); // bward
        file[88..96].copy_from_slice(b"LTL-IEEE");

        let rec_off = RECORD_LEN;
        let mut words = vec![0.0f64; DOUBLES_PER_RECORD];
        words[0] = 0.0; // next
        words[1] = 0.0; // prev
        words[2] = summaries.len() as f64;
        let mut offset = 3;
        for (doubles, ints) in summaries {
            for (i, d) in doubles.iter().enumerate() {
                words[offset + i] = *d;
            }
            let int_words = ints.chunks(2);
            let mut w = offset + nd;
            for pair in int_words {
                let a = pair[0];
                let b = *pair.get(1).unwrap_or(&0);
                let bytes = [a.to_le_bytes(), b.to_le_bytes()].concat();
                words[w] = f64::from_le_bytes(bytes.try_into().unwrap());
                w += 1;
            }
            offset += ss;
        }
        for (i, w) in words.iter().enumerate() {
            file[rec_off + i * 8..rec_off + i * 8 + 8].copy_from_slice(&w.to_le_bytes());
        }
        file
    }

    #[test]
    fn parses_synthetic_summary() {
        let bytes = synthetic_daf(2, 6, &[(
            vec![100.0, 200.0],
            vec![399, 3, 1, 2, 10, 50],
        )]);
        let daf = DafFile::parse(bytes).expect("should parse");
        assert_eq!(daf.summaries.len(), 1);
        let s = &daf.summaries[0];
        assert_eq!(s.doubles, vec![100.0, 200.0]);
        assert_eq!(s.ints, vec![399, 3, 1, 2, 10, 50]);
    }

    #[test]
    fn rejects_short_file() {
        let err = DafFile::parse(vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, KernelError::BadFormat(_)));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = vec![0u8; RECORD_LEN];
        bytes[0..8].copy_from_slice(b"NOTADAF ");
        let err = DafFile::parse(bytes).unwrap_err();
        assert!(matches!(err, KernelError::BadFormat(_)));
    }
}
