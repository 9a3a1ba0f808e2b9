//! Translation resolution.
//!
//! A translation entry overrides one field's text for one record in one
//! language. Lookup is exact on all four keys: content type and field name
//! compare case-sensitively, the record id is an exact integer match, and
//! the language code must match exactly; there is no locale fallback chain ("en-US"
//! does not fall back to "en"). A miss is a normal outcome, not an error:
//! callers substitute the record's own field value.

use anyhow::Result;
use std::collections::HashMap;

/// Source of stored translation entries.
///
/// Implemented by the database in production and by an in-memory map in
/// tests. Lookup misses are `Ok(None)`; only infrastructure failures (a
/// broken connection, say) surface as errors.
#[allow(async_fn_in_trait)]
pub trait TranslationLookup {
    async fn lookup(
        &self,
        content_type: &str,
        field: &str,
        record_id: i32,
        language_code: &str,
    ) -> Result<Option<String>>;
}

/// A record whose text fields can be served in other languages.
pub trait Localize {
    /// Content-type name used as the translation key, e.g. `"Project"`.
    fn content_type() -> &'static str;

    fn record_id(&self) -> i32;

    /// The fields administrators may translate for this record type.
    fn localized_fields() -> &'static [&'static str];

    /// Current value of a localized field; `None` for unknown names.
    fn field(&self, name: &str) -> Option<&str>;

    /// Overwrite a localized field. Unknown names are ignored.
    fn set_field(&mut self, name: &str, value: String);
}

/// Look up the translated text for one field of one record.
///
/// Returns `Ok(None)` when no entry matches; the caller is expected to fall
/// back to the record's native field value.
pub async fn resolve<L: TranslationLookup>(
    store: &L,
    content_type: &str,
    field: &str,
    record_id: i32,
    language_code: &str,
) -> Result<Option<String>> {
    store
        .lookup(content_type, field, record_id, language_code)
        .await
}

/// Resolve a set of fields for one record, substituting the record's own
/// value wherever no translation exists.
///
/// The output always contains exactly the requested fields: a field that is
/// neither translated nor present on the record maps to an empty string
/// rather than being dropped.
pub async fn resolve_fields<L, T>(
    store: &L,
    record: &T,
    fields: &[&str],
    language_code: &str,
) -> Result<HashMap<String, String>>
where
    L: TranslationLookup,
    T: Localize,
{
    let mut resolved = HashMap::with_capacity(fields.len());

    for &field in fields {
        let translated = store
            .lookup(T::content_type(), field, record.record_id(), language_code)
            .await?;

        let value = match translated {
            Some(text) => text,
            None => record.field(field).unwrap_or_default().to_string(),
        };
        resolved.insert(field.to_string(), value);
    }

    Ok(resolved)
}

/// Localize a record in place: every translatable field with a stored entry
/// for `language_code` is overwritten, the rest keep their native values.
pub async fn localize<L, T>(store: &L, record: &mut T, language_code: &str) -> Result<()>
where
    L: TranslationLookup,
    T: Localize,
{
    let resolved = resolve_fields(store, record, T::localized_fields(), language_code).await?;
    for (field, value) in resolved {
        record.set_field(&field, value);
    }

    Ok(())
}
