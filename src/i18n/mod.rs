//! Internationalization (i18n) module.
//!
//! Content records are stored in the site's default language; administrators
//! enter per-field overrides keyed by (content type, field, record id,
//! language code). The resolver looks up those overrides and falls back to
//! the record's own field value when none exists.
//!
//! - `resolver`: exact-match translation lookup and record localization

mod resolver;

pub use resolver::{localize, resolve, resolve_fields, Localize, TranslationLookup};
