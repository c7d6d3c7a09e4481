use super::{Replacement, Replacer};
use crate::context::{IdentifierResolver, SubmissionContext};
use ahash::AHashMap;
use serde_json::{Number, Value};
use std::sync::Arc;

/// Prefix of replacer ids that remap a cross-entity identifier, e.g. `related|attachment`.
pub const RELATED_PREFIX: &str = "related|";

/// Defines value-only replacers together with their registration.
macro_rules! define_replacers {
    ( $( ($struct_name:ident, $id:literal, |$value:ident| $body:expr) ),* $(,)? ) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $struct_name;
            impl Replacer for $struct_name {
                fn id(&self) -> &str { $id }
                fn process_on_download(&self, $value: &Value, _ctx: &SubmissionContext) -> Replacement {
                    Replacement::Value($body)
                }
            }
        )*

        pub(super) fn register_default_replacers(registry: &mut AHashMap<String, Box<dyn Replacer>>) {
            $( registry.insert($id.to_string(), Box::new($struct_name)); )*
        }
    };
}

define_replacers! {
    // Keeps the source value; never sent for translation.
    (CopyReplacer, "copy", |value| value.clone()),
    // Drops the value on import.
    (ExcludeReplacer, "exclude", |_value| Value::Null),
}

/// Remaps an entity identifier through an [`IdentifierResolver`].
///
/// Numeric identifiers stay numeric. Empty, zero and non-scalar values are left untouched.
pub struct RelatedReplacer {
    id: String,
    entity_type: String,
    resolver: Arc<dyn IdentifierResolver>,
}

impl RelatedReplacer {
    pub fn new(entity_type: &str, resolver: Arc<dyn IdentifierResolver>) -> Self {
        Self {
            id: format!("{}{}", RELATED_PREFIX, entity_type),
            entity_type: entity_type.to_string(),
            resolver,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }
}

impl Replacer for RelatedReplacer {
    fn id(&self) -> &str {
        &self.id
    }

    fn process_on_download(&self, original: &Value, ctx: &SubmissionContext) -> Replacement {
        let source_id = match original {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => return Replacement::Value(original.clone()),
        };
        if source_id.is_empty() || source_id == "0" {
            return Replacement::Value(original.clone());
        }

        let Some(target_id) = self.resolver.resolve(&self.entity_type, &source_id, ctx) else {
            return Replacement::Unresolved;
        };
        log::debug!(
            "Remapped {} '{}' to '{}'",
            self.entity_type,
            source_id,
            target_id
        );

        match original {
            Value::Number(_) => match target_id.parse::<i64>() {
                Ok(n) => Replacement::Value(Value::Number(Number::from(n))),
                Err(_) => Replacement::Value(Value::String(target_id)),
            },
            _ => Replacement::Value(Value::String(target_id)),
        }
    }
}
