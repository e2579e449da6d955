//! PII Redaction
//!
//! Obfuscates `field=value` pairs in log messages before they are emitted.

use regex::{Captures, Regex};
use std::borrow::Cow;

/// Fields treated as personally identifiable by default
pub const PII_FIELDS: [&str; 5] = ["name", "email", "password", "ssn", "phone"];
pub const REDACTION: &str = "***";
pub const SEPARATOR: &str = ";";

/// Compiled redaction rule for a fixed set of fields
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Option<Regex>,
    redaction: String,
}

impl Redactor {
    /// Match `field=` up to the next `separator` for every field in `fields`
    pub fn new<I, S>(fields: I, redaction: &str, separator: &str) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = fields
            .into_iter()
            .map(|f| regex::escape(f.as_ref()))
            .filter(|f| !f.is_empty())
            .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            let stop = if separator.is_empty() {
                String::new()
            } else {
                regex::escape(separator)
            };
            let value = if stop.is_empty() {
                ".*".to_string()
            } else {
                format!("[^{}]*", stop)
            };
            Some(Regex::new(&format!(
                r"\b({})={}",
                alternatives.join("|"),
                value
            ))?)
        };

        Ok(Self {
            pattern,
            redaction: redaction.to_string(),
        })
    }

    /// Redactor for [`PII_FIELDS`] with `***` and `;`
    pub fn pii() -> Self {
        Self::new(PII_FIELDS, REDACTION, SEPARATOR).unwrap_or_else(|_| Self::redact_all())
    }

    fn redact_all() -> Self {
        Self {
            pattern: Regex::new(".+").ok(),
            redaction: REDACTION.to_string(),
        }
    }

    pub fn redact<'m>(&self, message: &'m str) -> Cow<'m, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(message);
        };
        pattern.replace_all(message, |caps: &Captures| {
            match caps.get(1) {
                Some(field) => format!("{}={}", field.as_str(), self.redaction),
                None => self.redaction.clone(),
            }
        })
    }
}

/// Replace the value of every `field=value` pair named in `fields` with `redaction`.
///
/// Values run until the next `separator`. Falls back to redacting the whole
/// message if the pattern cannot be compiled.
pub fn filter_datum<S: AsRef<str>>(
    fields: &[S],
    redaction: &str,
    message: &str,
    separator: &str,
) -> String {
    match Redactor::new(fields, redaction, separator) {
        Ok(redactor) => redactor.redact(message).into_owned(),
        Err(_) => redaction.to_string(),
    }
}

/// [`filter_datum`] with the default PII fields
pub fn redact_pii(message: &str) -> String {
    filter_datum(&PII_FIELDS, REDACTION, message, SEPARATOR)
}
