use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::PropelResult;
use crate::foundation::ids::PropertyId;
use crate::scene::model::{Layer, Scene};
use crate::scene::names;
use crate::value::coerce::coerce;
use crate::value::types::{Value, ValueType};

/// A layer's resolved `Transform` group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TransformFields {
    pub(crate) anchor: Vec2,
    pub(crate) position: Vec2,
    pub(crate) scale: Vec2,
    /// Degrees.
    pub(crate) rotation: f64,
    pub(crate) opacity: f64,
}

impl TransformFields {
    /// Read the fields through `value`; missing leaves keep identity defaults.
    ///
    /// Fails when the layer has no `Transform` group.
    pub(crate) fn read(
        scene: &Scene,
        layer: &Layer,
        value: impl Fn(&PropertyId) -> Option<Value>,
    ) -> PropelResult<Self> {
        let group = scene.transform_group(layer)?;
        let num = |path: &[&str], default: f64| {
            scene
                .leaf_at(&group.properties, path)
                .and_then(|p| value(&p.id))
                .and_then(|v| coerce(v.value_type(), ValueType::Number, &v))
                .and_then(|v| v.as_number())
                .unwrap_or(default)
        };
        let pair = |compound: &str, x: &str, y: &str, default: f64| {
            Vec2::new(num(&[compound, x], default), num(&[compound, y], default))
        };
        Ok(Self {
            anchor: pair(names::ANCHOR, names::ANCHOR_X, names::ANCHOR_Y, 0.0),
            position: pair(names::POSITION, names::POSITION_X, names::POSITION_Y, 0.0),
            scale: pair(names::SCALE, names::SCALE_X, names::SCALE_Y, 1.0),
            rotation: num(&[names::ROTATION], 0.0),
            opacity: num(&[names::OPACITY], 1.0).clamp(0.0, 1.0),
        })
    }

    /// `T(position) * R(rotation) * S(scale) * T(-anchor)`.
    pub(crate) fn to_affine(self) -> Affine {
        Affine::translate(self.position)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-self.anchor)
    }
}
