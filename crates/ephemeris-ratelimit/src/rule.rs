//! Rule-driven key selection: the first matching rule in an ordered list
//! decides both the bucket's key source and its limit/period.

use std::time::Duration;

/// Where to pull the rate-limit key from.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    ClientIp,
    Header(String),
}

/// One entry in the ordered rule list. `path_prefix` of `None` matches any
/// request; a populated prefix restricts the rule to matching routes.
#[derive(Debug, Clone)]
pub struct Rule {
    pub path_prefix: Option<String>,
    pub key_source: KeySource,
    pub limit: f64,
    pub period: Duration,
}

impl Rule {
    pub fn matches(&self, path: &str) -> bool {
        match &self.path_prefix {
            Some(prefix) => path.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// An ordered list of [`Rule`]s; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The first rule whose `path_prefix` matches `path`, if any.
    pub fn select(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(path))
    }
}

/// Resolve a [`KeySource`] against request context into the literal
/// bucket key, namespaced by the rule's path prefix to keep distinct
/// rules' buckets independent even if they share a `key_source`.
pub fn resolve_key(rule: &Rule, client_ip: &str, header_value: Option<&str>) -> String {
    let raw = match &rule.key_source {
        KeySource::ClientIp => client_ip.to_string(),
        KeySource::Header(_name) => header_value.unwrap_or("anonymous").to_string(),
    };
    format!("{}:{}", rule.path_prefix.as_deref().unwrap_or("*"), raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(prefix: Option<&str>) -> Rule {
        Rule {
            path_prefix: prefix.map(str::to_string),
            key_source: KeySource::ClientIp,
            limit: 10.0,
            period: Duration::from_secs(60),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = RuleSet::new(vec![rule(Some("/v1/positions")), rule(None)]);
        let selected = rules.select("/v1/positions/foo").unwrap();
        assert_eq!(selected.path_prefix.as_deref(), Some("/v1/positions"));
    }

    #[test]
    fn falls_back_to_catch_all() {
        let rules = RuleSet::new(vec![rule(Some("/v1/positions")), rule(None)]);
        let selected = rules.select("/v1/geocode/search").unwrap();
        assert_eq!(selected.path_prefix, None);
    }

    #[test]
    fn keys_are_namespaced_by_rule() {
        let r1 = rule(Some("/a"));
        let r2 = rule(Some("/b"));
        assert_ne!(resolve_key(&r1, "1.2.3.4", None), resolve_key(&r2, "1.2.3.4", None));
    }

    #[test]
    fn header_source_falls_back_to_anonymous() {
        let mut r = rule(None);
        r.key_source = KeySource::Header("x-user-id".to_string());
        assert!(resolve_key(&r, "1.2.3.4", None).ends_with("anonymous"));
        assert!(resolve_key(&r, "1.2.3.4", Some("alice")).ends_with("alice"));
    }
}
