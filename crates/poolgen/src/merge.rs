//! deep merge of configuration objects
//!
//! Layers are given highest precedence first. Nested objects are merged key by key, every other
//! value (arrays included) is taken whole from the highest layer that defines it.
//!
//! The result lists keys in the order they are first seen when walking from the lowest layer up,
//! so a base document keeps its shape and overrides only add or replace entries.
use crate::value::{Object, Value};

/// Merge `layers`, where `layers[0]` wins over `layers[1]` and so on
///
/// Inputs are left untouched.
pub fn merge(layers: &[&Object]) -> Object {
    let mut result = Object::new();
    for layer in layers.iter().rev() {
        merge_into(&mut result, layer);
    }
    result
}

/// Worker configuration precedence: pool override, then image set default, then whatever the
/// launch configuration already holds
pub fn layered(pool_override: &Object, image_set_default: &Object, existing: &Object) -> Object {
    merge(&[pool_override, image_set_default, existing])
}

/// Apply `overlay` on top of `base`
fn merge_into(base: &mut Object, overlay: &Object) {
    for (key, value) in overlay {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (base.get_mut(key), value) {
            merge_into(existing, nested);
            continue;
        }

        tracing::trace!(%key, "replace");
        base.insert(key.clone(), value.clone());
    }
}
