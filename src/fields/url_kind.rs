//! URL kinds: Url and ExternalUrl
//!
//! Location values are stored raw and resolved on read against the
//! context's base domain. An already-normal absolute URL is kept
//! unchanged; anything else is composed as base + exactly one slash +
//! path.

use super::{FieldState, ResolveContext, TypedField, Value};
use crate::error::Result;
use crate::normalize::normalize;

impl TypedField {
    /// Store the raw location; empty input is a no-op.
    pub(super) fn set_raw_url(&mut self, value: Value) -> Result<()> {
        let Some(raw) = value.as_text() else {
            return Ok(());
        };
        let raw = raw.trim().to_string();
        if !raw.is_empty() {
            self.state = FieldState::RawUrl(raw);
        }
        Ok(())
    }

    /// Resolve the stored location against the context base.
    ///
    /// Returns `None` when the value is relative and no base domain is
    /// available; the caller turns that into a required-field error when
    /// applicable.
    pub(super) fn resolve_url(&self, raw: &str, ctx: &ResolveContext) -> Option<String> {
        // Keep the caller's exact spelling, not the re-serialized URL.
        if normalize(raw).is_some() {
            return Some(raw.to_string());
        }

        let base = ctx.base_url?;
        let base = base.as_str().trim_end_matches('/');
        Some(format!("{}/{}", base, raw.trim_start_matches('/')))
    }
}
