use serde::{Deserialize, Serialize};

/// Bounds applied to sources before and while they are parsed.
///
/// Deserializes from a partial object; missing keys keep their defaults:
///
/// ```
/// use rule_dsl::Limits;
///
/// let limits: Limits = serde_json::from_str(r#"{"max_depth": 16}"#).unwrap();
/// assert_eq!(limits.max_depth, 16);
/// assert_eq!(limits.max_source_len, Limits::default().max_source_len);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Longest accepted source, in characters
    pub max_source_len: usize,
    /// Deepest accepted nesting of sub-expressions
    pub max_depth: usize,
}

impl Limits {
    pub const DEFAULT_MAX_SOURCE_LEN: usize = 2000;
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// No bounds at all.
    pub fn unbounded() -> Self {
        Limits {
            max_source_len: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_source_len: Self::DEFAULT_MAX_SOURCE_LEN,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
