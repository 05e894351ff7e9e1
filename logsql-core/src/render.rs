//! Parameterized statement rendering.
//!
//! A template is literal SQL text with `?` placeholders. Placeholders inside
//! single- or double-quoted spans (with doubled-quote escaping) are literal
//! text, not parameters. Rendering substitutes every placeholder with the
//! SQL literal form of its bound value, so the dispatched query is plain
//! text with no out-of-band parameter channel.

use crate::error::TemplateError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

// ============================================================================
// PARAMETER VALUES
// ============================================================================

/// A bindable parameter value.
///
/// The temporal variants select the ISO-8601 profile used when rendering:
/// `Instant` renders in UTC with a `Z` suffix, `OffsetDateTime` keeps its
/// offset, and the local variants render without any zone designator.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Instant(DateTime<Utc>),
    OffsetDateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    LocalDate(NaiveDate),
}

macro_rules! impl_from_param {
    ($($from:ty => $variant:ident),* $(,)?) => {
        $(impl From<$from> for ParamValue {
            fn from(value: $from) -> Self {
                ParamValue::$variant(value.into())
            }
        })*
    };
}

impl_from_param! {
    bool => Bool,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Decimal => Decimal,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    DateTime<Utc> => Instant,
    DateTime<FixedOffset> => OffsetDateTime,
    NaiveDateTime => LocalDateTime,
    NaiveDate => LocalDate,
}

/// State of one positional parameter slot.
///
/// `Null` is an explicit SQL NULL binding; `Unset` means the slot was never
/// bound and rendering must fail.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamSlot {
    #[default]
    Unset,
    Null,
    Value(ParamValue),
}

// ============================================================================
// STATEMENT TEMPLATE
// ============================================================================

/// An immutable statement template with its placeholder count computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTemplate {
    text: String,
    placeholders: usize,
}

impl StatementTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let placeholders = count_placeholders(&text);
        Self { text, placeholders }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Render the template into literal query text.
    ///
    /// `slots` must have exactly one entry per placeholder (checked before
    /// anything else, so a mismatch fails before any dispatch). Reading an
    /// `Unset` slot fails with the 0-based slot index.
    pub fn render(&self, slots: &[ParamSlot]) -> Result<String, TemplateError> {
        if slots.len() != self.placeholders {
            return Err(TemplateError::PlaceholderCountMismatch {
                expected: self.placeholders,
                supplied: slots.len(),
            });
        }
        if self.placeholders == 0 {
            return Ok(self.text.clone());
        }

        let mut out = String::with_capacity(self.text.len() + 16 * slots.len());
        let mut in_single = false;
        let mut in_double = false;
        let mut slot_index = 0;
        let mut chars = self.text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    out.push(c);
                    if in_single && chars.peek() == Some(&'\'') {
                        out.push('\'');
                        chars.next();
                    } else {
                        in_single = !in_single;
                    }
                }
                '"' => {
                    out.push(c);
                    if in_double && chars.peek() == Some(&'"') {
                        out.push('"');
                        chars.next();
                    } else {
                        in_double = !in_double;
                    }
                }
                '?' if !in_single && !in_double => {
                    match &slots[slot_index] {
                        ParamSlot::Unset => {
                            return Err(TemplateError::SlotUnset { index: slot_index })
                        }
                        ParamSlot::Null => out.push_str("NULL"),
                        ParamSlot::Value(value) => out.push_str(&format_value(value)?),
                    }
                    slot_index += 1;
                }
                _ => out.push(c),
            }
        }

        Ok(out)
    }
}

/// Number of `?` placeholders outside quoted spans.
pub fn count_placeholders(text: &str) -> usize {
    let mut in_single = false;
    let mut in_double = false;
    let mut count = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if in_single && chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    in_single = !in_single;
                }
            }
            '"' => {
                if in_double && chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_double = !in_double;
                }
            }
            '?' if !in_single && !in_double => count += 1,
            _ => {}
        }
    }
    count
}

// ============================================================================
// LITERAL FORMATTING
// ============================================================================

fn format_value(value: &ParamValue) -> Result<String, TemplateError> {
    match value {
        ParamValue::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        ParamValue::Int(i) => Ok(i.to_string()),
        ParamValue::Long(l) => Ok(l.to_string()),
        ParamValue::Float(f) => {
            if !f.is_finite() {
                return Err(TemplateError::UnrepresentableFloat {
                    value: f.to_string(),
                });
            }
            Ok(f.to_string())
        }
        ParamValue::Double(d) => {
            if !d.is_finite() {
                return Err(TemplateError::UnrepresentableFloat {
                    value: d.to_string(),
                });
            }
            Ok(d.to_string())
        }
        // rust_decimal's Display is always a plain string, never exponent form.
        ParamValue::Decimal(d) => Ok(d.to_string()),
        ParamValue::Text(s) => Ok(quote(s)),
        ParamValue::Bytes(b) => Ok(format!("X'{}'", hex::encode_upper(b))),
        ParamValue::Instant(ts) => Ok(quote(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        ParamValue::OffsetDateTime(ts) => Ok(quote(&ts.to_rfc3339())),
        ParamValue::LocalDateTime(ts) => {
            Ok(quote(&ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        }
        ParamValue::LocalDate(d) => Ok(quote(&d.format("%Y-%m-%d").to_string())),
    }
}

/// Single-quote a string, doubling every embedded single quote.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bound(values: Vec<ParamValue>) -> Vec<ParamSlot> {
        values.into_iter().map(ParamSlot::Value).collect()
    }

    #[test]
    fn test_count_ignores_quoted_placeholders() {
        assert_eq!(count_placeholders("SELECT * WHERE a = ?"), 1);
        assert_eq!(count_placeholders("SELECT '?' , ?"), 1);
        assert_eq!(count_placeholders("SELECT \"?\" , ?"), 1);
        assert_eq!(count_placeholders("SELECT 'it''s ?' , ?, ?"), 2);
        assert_eq!(count_placeholders("no params"), 0);
    }

    #[test]
    fn test_render_substitutes_in_order() {
        let template = StatementTemplate::new("SELECT ? , ?");
        let rendered = template
            .render(&bound(vec![
                ParamValue::Int(1),
                ParamValue::Text("x".to_string()),
            ]))
            .unwrap();
        assert_eq!(rendered, "SELECT 1 , 'x'");
    }

    #[test]
    fn test_render_count_mismatch_fails_fast() {
        let template = StatementTemplate::new("SELECT ? , ?");
        let err = template.render(&bound(vec![ParamValue::Int(1)])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::PlaceholderCountMismatch {
                expected: 2,
                supplied: 1
            }
        );
    }

    #[test]
    fn test_render_unset_slot_fails() {
        let template = StatementTemplate::new("SELECT ? , ?");
        let slots = vec![ParamSlot::Value(ParamValue::Int(1)), ParamSlot::Unset];
        assert_eq!(
            template.render(&slots).unwrap_err(),
            TemplateError::SlotUnset { index: 1 }
        );
    }

    #[test]
    fn test_render_explicit_null() {
        let template = StatementTemplate::new("WHERE a = ?");
        let rendered = template.render(&[ParamSlot::Null]).unwrap();
        assert_eq!(rendered, "WHERE a = NULL");
    }

    #[test]
    fn test_text_quote_doubling_round_trips() {
        let template = StatementTemplate::new("WHERE name = ?");
        let rendered = template
            .render(&bound(vec![ParamValue::Text("O'Brien".to_string())]))
            .unwrap();
        assert_eq!(rendered, "WHERE name = 'O''Brien'");
        // Unescaping the literal reproduces the original exactly.
        let literal = &rendered["WHERE name = '".len()..rendered.len() - 1];
        assert_eq!(literal.replace("''", "'"), "O'Brien");
    }

    #[test]
    fn test_placeholder_inside_literal_is_not_substituted() {
        let template = StatementTemplate::new("SELECT 'a?b' , ?");
        let rendered = template.render(&bound(vec![ParamValue::Int(5)])).unwrap();
        assert_eq!(rendered, "SELECT 'a?b' , 5");
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let template = StatementTemplate::new("SELECT ?");
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = template
                .render(&bound(vec![ParamValue::Double(value)]))
                .unwrap_err();
            assert!(matches!(err, TemplateError::UnrepresentableFloat { .. }));
        }
        let err = template
            .render(&bound(vec![ParamValue::Float(f32::NAN)]))
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnrepresentableFloat { .. }));
    }

    #[test]
    fn test_decimal_renders_plain_no_exponent() {
        let template = StatementTemplate::new("SELECT ?");
        let value = "0.0000001".parse::<Decimal>().unwrap();
        let rendered = template
            .render(&bound(vec![ParamValue::Decimal(value)]))
            .unwrap();
        assert_eq!(rendered, "SELECT 0.0000001");
    }

    #[test]
    fn test_bytes_render_as_hex_literal() {
        let template = StatementTemplate::new("SELECT ?");
        let rendered = template
            .render(&bound(vec![ParamValue::Bytes(vec![0xDE, 0xAD, 0x01])]))
            .unwrap();
        assert_eq!(rendered, "SELECT X'DEAD01'");
    }

    #[test]
    fn test_temporal_profiles() {
        let template = StatementTemplate::new("SELECT ?");

        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
        assert_eq!(
            template
                .render(&bound(vec![ParamValue::Instant(instant)]))
                .unwrap(),
            "SELECT '2024-03-05T10:30:00Z'"
        );

        let offset = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 10, 30, 0)
            .unwrap();
        assert_eq!(
            template
                .render(&bound(vec![ParamValue::OffsetDateTime(offset)]))
                .unwrap(),
            "SELECT '2024-03-05T10:30:00+02:00'"
        );

        let local = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            template
                .render(&bound(vec![ParamValue::LocalDateTime(local)]))
                .unwrap(),
            "SELECT '2024-03-05T10:30:00'"
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            template
                .render(&bound(vec![ParamValue::LocalDate(date)]))
                .unwrap(),
            "SELECT '2024-03-05'"
        );
    }

    #[test]
    fn test_boolean_literals() {
        let template = StatementTemplate::new("SELECT ?, ?");
        let rendered = template
            .render(&bound(vec![ParamValue::Bool(true), ParamValue::Bool(false)]))
            .unwrap();
        assert_eq!(rendered, "SELECT TRUE, FALSE");
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
