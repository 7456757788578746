use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid interpreter version '{raw}': {reason}")]
pub struct ParseVersionError {
    raw: String,
    reason: String,
}

/// A dotted interpreter version such as `3.10.13`.
///
/// Ordering compares the numeric components as a tuple, so `3.9` sorts
/// below `3.13`. The original spelling is kept for prefix matching.
#[derive(Debug, Clone)]
pub struct InterpreterVersion {
    raw: String,
    components: Vec<u64>,
}

impl InterpreterVersion {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Textual prefix match: `3.9` matches `3.9.2` and `3.9.12`.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.raw.starts_with(prefix)
    }
}

impl FromStr for InterpreterVersion {
    type Err = ParseVersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(ParseVersionError {
                raw: raw.to_string(),
                reason: "version is empty".into(),
            });
        }
        let components = raw
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| ParseVersionError {
                    raw: raw.to_string(),
                    reason: format!("component '{part}' is not a non-negative integer"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            components,
        })
    }
}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for InterpreterVersion {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for InterpreterVersion {}

impl Hash for InterpreterVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl PartialOrd for InterpreterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InterpreterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}
