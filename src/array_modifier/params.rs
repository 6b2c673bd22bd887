use std::collections::BTreeMap;

use crate::array_modifier::types::{ArrayModifierParams, ComputedFields, IndexTransform};
use crate::foundation::core::Vec2;
use crate::foundation::error::{PropelError, PropelResult};
use crate::foundation::ids::PropertyId;
use crate::scene::model::{PropertyGroup, Scene};
use crate::scene::names;
use crate::value::coerce::coerce;
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

/// Leaf ids of the per-index step fields of one modifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct StepLeaves {
    pub(crate) translate_x: Option<PropertyId>,
    pub(crate) translate_y: Option<PropertyId>,
    pub(crate) rotation: Option<PropertyId>,
    pub(crate) scale_x: Option<PropertyId>,
    pub(crate) scale_y: Option<PropertyId>,
}

impl StepLeaves {
    pub(crate) fn of(scene: &Scene, modifier: &PropertyGroup) -> Self {
        let leaf = |path: &[&str]| {
            let mut full = vec![names::TRANSFORM];
            full.extend_from_slice(path);
            scene
                .leaf_at(&modifier.properties, &full)
                .map(|p| p.id.clone())
        };
        Self {
            translate_x: leaf(&[names::POSITION, names::POSITION_X]),
            translate_y: leaf(&[names::POSITION, names::POSITION_Y]),
            rotation: leaf(&[names::ROTATION]),
            scale_x: leaf(&[names::SCALE, names::SCALE_X]),
            scale_y: leaf(&[names::SCALE, names::SCALE_Y]),
        }
    }

    /// Step for one index, reading values through `value`.
    pub(crate) fn read(&self, value: impl Fn(&PropertyId) -> Option<Value>) -> IndexTransform {
        let id = IndexTransform::IDENTITY;
        let num = |leaf: &Option<PropertyId>, default: f64| {
            leaf.as_ref()
                .and_then(&value)
                .and_then(|v| number(&v))
                .unwrap_or(default)
        };
        IndexTransform {
            translate: Vec2::new(
                num(&self.translate_x, id.translate.x),
                num(&self.translate_y, id.translate.y),
            ),
            rotation: num(&self.rotation, id.rotation),
            scale: Vec2::new(num(&self.scale_x, id.scale.x), num(&self.scale_y, id.scale.y)),
        }
    }

    /// Fields that have an entry in a per-index value table.
    pub(crate) fn computed_in(&self, table: &BTreeMap<PropertyId, Value>) -> ComputedFields {
        let has = |leaf: &Option<PropertyId>| {
            leaf.as_ref().is_some_and(|id| table.contains_key(id))
        };
        ComputedFields {
            translate_x: has(&self.translate_x),
            translate_y: has(&self.translate_y),
            rotation: has(&self.rotation),
            scale_x: has(&self.scale_x),
            scale_y: has(&self.scale_y),
        }
    }
}

fn number(v: &Value) -> Option<f64> {
    coerce(v.value_type(), ValueType::Number, v).and_then(|v| v.as_number())
}

/// Resolve the settings of an `ArrayModifier` group.
///
/// A missing `Count` or an unsupported `TransformBehavior` is a structural error.
pub(crate) fn read_params(
    scene: &Scene,
    modifier: &PropertyGroup,
    value: impl Fn(&PropertyId) -> Option<Value>,
    max_count: u32,
) -> PropelResult<ArrayModifierParams> {
    let leaf_value = |path: &[&str]| {
        scene
            .leaf_at(&modifier.properties, path)
            .and_then(|p| value(&p.id))
    };

    let count = leaf_value(&[names::COUNT])
        .as_ref()
        .and_then(number)
        .ok_or_else(|| {
            PropelError::structure(format!("array modifier '{}' has no numeric Count", modifier.id))
        })?;
    let count = if count.is_finite() {
        count.floor().clamp(0.0, f64::from(max_count)) as usize
    } else {
        0
    };

    let policy = match leaf_value(&[names::TRANSFORM_BEHAVIOR]) {
        None => TransformBehavior::Recursive,
        Some(v) => coerce(v.value_type(), ValueType::TransformBehavior, &v)
            .and_then(|v| match v {
                Value::TransformBehavior(b) => Some(b),
                _ => None,
            })
            .ok_or_else(|| {
                PropelError::structure(format!(
                    "array modifier '{}': unsupported transform behavior {v:?}",
                    modifier.id
                ))
            })?,
    };

    let origin_behavior = leaf_value(&[names::ORIGIN_BEHAVIOR])
        .and_then(|v| coerce(v.value_type(), ValueType::OriginBehavior, &v))
        .and_then(|v| match v {
            Value::OriginBehavior(b) => Some(b),
            _ => None,
        })
        .unwrap_or(OriginBehavior::Relative);

    let origin = Vec2::new(
        leaf_value(&[names::ORIGIN, names::ORIGIN_X])
            .as_ref()
            .and_then(number)
            .unwrap_or(0.0),
        leaf_value(&[names::ORIGIN, names::ORIGIN_Y])
            .as_ref()
            .and_then(number)
            .unwrap_or(0.0),
    );
    let correction = leaf_value(&[names::ROTATION_CORRECTION])
        .as_ref()
        .and_then(number)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    Ok(ArrayModifierParams {
        count,
        policy,
        origin_behavior,
        origin,
        correction,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/array_modifier/params.rs"]
mod tests;
