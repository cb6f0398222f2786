//! String-like pattern matching for principal ARNs
//!
//! Identity-provider-generated principal names (SSO role suffixes in
//! particular) are not deterministic and cannot be hardcoded, so every
//! place a principal pattern appears uses `*`/`?` glob semantics instead of
//! exact equality. The matcher here mirrors the evaluation the policy
//! engine applies to `...Like` condition operators, letting callers
//! pre-check a pattern against a known runtime principal.

use regex::Regex;

use crate::errors::{PolicyError, Result};

/// A compiled `*`/`?` pattern.
#[derive(Debug, Clone)]
pub struct StringLikePattern {
    regex: Regex,
}

impl StringLikePattern {
    /// Compile a pattern. `*` matches any run of characters (including
    /// none), `?` matches exactly one character, everything else is
    /// literal.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                _ => expr.push_str(&regex::escape(&ch.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| PolicyError::PatternCompile {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self { regex })
    }

    /// Test a value against the compiled pattern.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// One-shot match of `value` against `pattern`.
pub fn string_like_match(pattern: &str, value: &str) -> Result<bool> {
    Ok(StringLikePattern::compile(pattern)?.matches(value))
}
