//! Catalog name patterns.
//!
//! The catalog operations filter entity and column names with SQL-style
//! patterns: `%` matches any run of characters (including none), `_` matches
//! exactly one, everything else is literal. Matching is case-insensitive and
//! anchored to the whole value.

use crate::error::PatternError;
use regex::{Regex, RegexBuilder};

/// A compiled name pattern.
///
/// An absent or empty source pattern matches everything.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Option<Regex>,
}

impl GlobPattern {
    /// Compile a pattern, treating `None` and `""` as match-all.
    pub fn compile(pattern: Option<&str>) -> Result<Self, PatternError> {
        let pattern = match pattern {
            None | Some("") => return Ok(Self { regex: None }),
            Some(p) => p,
        };

        let mut translated = String::with_capacity(pattern.len() + 8);
        translated.push('^');
        let mut literal = String::new();
        for c in pattern.chars() {
            match c {
                '%' => {
                    flush_literal(&mut translated, &mut literal);
                    translated.push_str(".*");
                }
                '_' => {
                    flush_literal(&mut translated, &mut literal);
                    translated.push('.');
                }
                other => literal.push(other),
            }
        }
        flush_literal(&mut translated, &mut literal);
        translated.push('$');

        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { regex: Some(regex) })
    }

    /// Whether the whole value matches the pattern.
    pub fn matches(&self, value: &str) -> bool {
        match &self.regex {
            None => true,
            Some(regex) => regex.is_match(value),
        }
    }
}

fn flush_literal(translated: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        translated.push_str(&regex::escape(literal));
        literal.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Every value matches itself used verbatim as a pattern, regardless
        /// of regex metacharacters it may contain.
        #[test]
        fn prop_literal_pattern_matches_itself(value in "[a-zA-Z0-9.+()\\[\\]|{}$^*-]{1,30}") {
            // `%`/`_` excluded: they are wildcards, not literals.
            let pattern = GlobPattern::compile(Some(&value)).unwrap();
            prop_assert!(pattern.matches(&value));
        }

        /// `%` prefix patterns match any extension of the stem.
        #[test]
        fn prop_percent_suffix_matches_extensions(
            stem in "[a-z]{1,10}",
            tail in "[a-z0-9]{0,10}"
        ) {
            let pattern = GlobPattern::compile(Some(&format!("{stem}%"))).unwrap();
            let candidate = format!("{stem}{tail}");
            prop_assert!(pattern.matches(&candidate));
        }
    }
}
