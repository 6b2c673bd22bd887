use crate::foundation::core::{Affine, Vec2, mul_vec2};
use crate::value::types::{OriginBehavior, TransformBehavior};

/// Translation, rotation (degrees) and scale of one array-modifier step or instance.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexTransform {
    /// Translation.
    pub translate: Vec2,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Anisotropic scale.
    pub scale: Vec2,
}

impl Default for IndexTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl IndexTransform {
    /// No translation, rotation or scaling.
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::new(1.0, 1.0),
    };

    /// `T(translate) * R(rotation) * S(scale)`.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translate)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Which step fields come from a per-index computed source.
///
/// Under [`TransformBehavior::AbsoluteForComputed`] these fields restart from
/// the identity at every step instead of accumulating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ComputedFields {
    /// `Position X`.
    pub translate_x: bool,
    /// `Position Y`.
    pub translate_y: bool,
    /// `Rotation`.
    pub rotation: bool,
    /// `Scale X`.
    pub scale_x: bool,
    /// `Scale Y`.
    pub scale_y: bool,
}

impl ComputedFields {
    /// `true` when no field is computed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fields computed in either set.
    pub fn union(self, other: Self) -> Self {
        Self {
            translate_x: self.translate_x || other.translate_x,
            translate_y: self.translate_y || other.translate_y,
            rotation: self.rotation || other.rotation,
            scale_x: self.scale_x || other.scale_x,
            scale_y: self.scale_y || other.scale_y,
        }
    }
}

/// Resolved settings of one `ArrayModifier` group.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayModifierParams {
    /// Number of instances, already floored and clamped.
    pub count: usize,
    /// Composition policy.
    pub policy: TransformBehavior,
    /// Pivot placement.
    pub origin_behavior: OriginBehavior,
    /// Pivot, in layer space.
    pub origin: Vec2,
    /// Rotation-correction blend in `[0, 1]`.
    pub correction: f64,
}

/// One composed instance.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposedInstance {
    /// Accumulated fields: the matrix translation, summed rotation and
    /// multiplied scale. They describe `matrix` exactly while scale is uniform.
    pub fields: IndexTransform,
    /// Accumulated matrix, in pivot space.
    pub matrix: Affine,
}

impl ComposedInstance {
    /// Apply `step` on the right of this instance.
    pub(crate) fn then(self, step: IndexTransform) -> Self {
        let matrix = self.matrix * step.to_affine();
        Self {
            fields: IndexTransform {
                translate: matrix.translation(),
                rotation: self.fields.rotation + step.rotation,
                scale: mul_vec2(self.fields.scale, step.scale),
            },
            matrix,
        }
    }
}
