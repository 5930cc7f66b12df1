use std::borrow::Cow;
use std::sync::Arc;

use crate::bail;
use crate::error::{ErrorKind, SinkResult};
use crate::types::Row;

/// Rewrites field names that the warehouse would reject into legal names.
pub trait NameSanitizer {
    /// Sanitizes every field name of `row`, including the names inside nested maps.
    fn sanitize(&self, row: Row) -> SinkResult<Row>;
}

impl<T> NameSanitizer for Arc<T>
where
    T: NameSanitizer + ?Sized,
{
    fn sanitize(&self, row: Row) -> SinkResult<Row> {
        (**self).sanitize(row)
    }
}

/// Sanitizer enforcing the warehouse column naming rule.
///
/// A field name may only contain ASCII letters, digits and underscores and must begin with a
/// letter or an underscore. Every other character becomes `_`, and names starting with anything
/// but a letter or an underscore are prefixed with `_`. Lists are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidCharSanitizer;

impl InvalidCharSanitizer {
    /// Returns the sanitized form of a single field name.
    pub fn sanitize_name(name: &str) -> Cow<'_, str> {
        let is_valid_char = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let starts_validly = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

        if starts_validly && name.chars().all(is_valid_char) {
            return Cow::Borrowed(name);
        }

        let replaced: String = name
            .chars()
            .map(|c| if is_valid_char(c) { c } else { '_' })
            .collect();

        // An empty name has no first character, so it matches neither the prefixing rule nor
        // any legal form and is left as is for the warehouse to reject.
        match replaced.chars().next() {
            Some(c) if !(c.is_ascii_alphabetic() || c == '_') => Cow::Owned(format!("_{replaced}")),
            _ => Cow::Owned(replaced),
        }
    }
}

impl NameSanitizer for InvalidCharSanitizer {
    fn sanitize(&self, row: Row) -> SinkResult<Row> {
        let mut sanitized = Row::with_capacity(row.len());

        for (name, value) in row {
            let value = match value {
                serde_json::Value::Object(nested) => serde_json::Value::Object(self.sanitize(nested)?),
                other => other,
            };

            let sanitized_name = Self::sanitize_name(&name).into_owned();
            if sanitized.contains_key(&sanitized_name) {
                bail!(
                    ErrorKind::InvalidFieldName,
                    "Sanitized field names collide",
                    format!(
                        "Field `{name}` sanitizes to `{sanitized_name}`, which is already present in the row"
                    )
                );
            }

            sanitized.insert(sanitized_name, value);
        }

        Ok(sanitized)
    }
}
