/*
[INPUT]:  Comma-separated allow-list of origins (or `*`)
[OUTPUT]: postMessage target origin and receiver-side membership checks
[POS]:    Transport support - origin allow-list shared by sender and receiver
[UPDATE]: When origin matching rules change
*/

use std::fmt;

pub const WILDCARD_ORIGIN: &str = "*";

/// Allow-list of host origins.
///
/// An empty configuration means wildcard, which disables receiver checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    origins: Vec<String>,
}

impl OriginPolicy {
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Self::wildcard();
        }
        Self { origins }
    }

    pub fn wildcard() -> Self {
        Self {
            origins: vec![WILDCARD_ORIGIN.to_string()],
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.origins.iter().any(|origin| origin == WILDCARD_ORIGIN)
    }

    /// Target origin for outgoing posts: `*` or the first allow-listed origin
    pub fn target_origin(&self) -> &str {
        if self.is_wildcard() {
            WILDCARD_ORIGIN
        } else {
            // parse() guarantees at least one entry
            self.origins.first().map(String::as_str).unwrap_or(WILDCARD_ORIGIN)
        }
    }

    /// Exact-match membership; always true under wildcard
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.is_wildcard() || self.origins.iter().any(|allowed| allowed == origin)
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl fmt::Display for OriginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origins.join(","))
    }
}
