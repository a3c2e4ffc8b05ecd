//! Array kinds
//!
//! An array field holds independently constructed elements of its inner
//! kind. Nested input sequences flatten, invalid elements are dropped,
//! and an optional element cap truncates to the first N on read.

use super::{FieldKind, FieldState, Resolved, ResolveContext, TypedField, Value};
use crate::error::Result;

impl TypedField {
    /// Append one value, flattening nested sequences. Each leaf gets its
    /// own element holder so siblings never share mutable state.
    pub(super) fn append_elements(&mut self, inner: &FieldKind, value: Value) -> Result<()> {
        match value {
            Value::List(items) => {
                for item in items {
                    self.append_elements(inner, item)?;
                }
                Ok(())
            }
            leaf => {
                let mut element = self.new_element(inner);
                // Element-level validation failures drop the element, so
                // the required flag must not fire here.
                if element.set(leaf).is_ok() && element.is_set() {
                    if let FieldState::Elements(elements) = &mut self.state {
                        elements.push(element);
                    }
                }
                Ok(())
            }
        }
    }

    /// Build an unpopulated element from the field's kind descriptor
    fn new_element(&self, inner: &FieldKind) -> TypedField {
        TypedField {
            schema: self.schema,
            kind: inner.clone(),
            required: false,
            state: FieldState::Unset,
            attrs: self.schema.attributes.iter().map(TypedField::new).collect(),
        }
    }

    /// Resolve the elements: a plain list when no element carries
    /// attributes, the attributed form for every element otherwise.
    pub(super) fn resolve_elements(
        &self,
        elements: &[TypedField],
        ctx: &ResolveContext,
    ) -> Result<Option<Resolved>> {
        let mut resolved = Vec::new();
        let mut any_attrs = false;

        for element in elements {
            let Some(value) = element.resolve(ctx)? else {
                continue;
            };
            if matches!(value, Resolved::Attributed { .. }) {
                any_attrs = true;
            }
            resolved.push(value);
        }

        if let Some(max) = self.schema.max_elements {
            resolved.truncate(max);
        }

        if resolved.is_empty() {
            return Ok(None);
        }

        if any_attrs {
            // Homogeneous form: give attribute-less elements an empty map.
            resolved = resolved
                .into_iter()
                .map(|value| match value {
                    Resolved::Scalar(text) => Resolved::Attributed {
                        value: text,
                        attrs: Default::default(),
                    },
                    other => other,
                })
                .collect();
        }

        Ok(Some(Resolved::List(resolved)))
    }
}
