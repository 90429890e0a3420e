//! Dialect repair for stringified policy text
//!
//! Exports that stringify native structures write single-quoted strings and
//! capitalized boolean literals. [`repair`] rewrites that dialect into strict
//! JSON using the fixed table in [`SUBSTITUTIONS`].
//!
//! Quote substitution is blind: a value that legitimately contains an
//! apostrophe comes out with an extra `"` and fails to parse afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

/// One rewrite rule of the repair table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    /// Text to replace
    pub from: &'static str,
    /// Replacement text
    pub to: &'static str,
    /// Only replace occurrences that form a whole identifier token
    pub whole_token: bool,
}

/// Rewrite rules, applied in order
pub const SUBSTITUTIONS: &[Substitution] = &[
    Substitution {
        from: "'",
        to: "\"",
        whole_token: false,
    },
    Substitution {
        from: "True",
        to: "true",
        whole_token: true,
    },
    Substitution {
        from: "False",
        to: "false",
        whole_token: true,
    },
];

static TOKEN_PATTERNS: Lazy<Vec<Option<Regex>>> = Lazy::new(|| {
    SUBSTITUTIONS
        .iter()
        .map(|sub| {
            sub.whole_token.then(|| {
                Regex::new(&format!(r"\b{}\b", regex::escape(sub.from)))
                    .expect("substitution table holds literal tokens")
            })
        })
        .collect()
});

/// Rewrite stringified-native text into strict JSON text
#[must_use]
pub fn repair(raw: &str) -> String {
    let mut text = raw.to_owned();
    for (sub, pattern) in SUBSTITUTIONS.iter().zip(TOKEN_PATTERNS.iter()) {
        text = match pattern {
            Some(re) => re.replace_all(&text, sub.to).into_owned(),
            None => text.replace(sub.from, sub.to),
        };
    }
    text
}
