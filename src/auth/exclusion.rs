//! Excluded-Path Policy
//!
//! Decides whether a request path needs authentication at all. Trailing
//! slashes are ignored on both sides; an entry ending in `*` matches by prefix.

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    fn parse(entry: &str) -> Self {
        let entry = entry.trim_end_matches('/');
        match entry.strip_suffix('*') {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(entry.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Ordered, immutable set of paths that bypass authentication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPolicy {
    raw: Vec<String>,
    patterns: Vec<PathPattern>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        let patterns = raw.iter().map(|e| PathPattern::parse(e)).collect();
        Self { raw, patterns }
    }

    /// Entries as configured
    pub fn entries(&self) -> &[String] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// `false` only when `path` matches an excluded entry.
    ///
    /// A missing or empty path, or an empty policy, always requires auth.
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => return true,
        };
        if self.patterns.is_empty() {
            return true;
        }

        let path = path.trim_end_matches('/');
        !self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}
