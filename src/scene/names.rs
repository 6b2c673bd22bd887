//! Structurally significant property and group names.

/// Layer transform group.
pub const TRANSFORM: &str = "Transform";
/// Group holding a layer's modifiers.
pub const MODIFIERS: &str = "Modifiers";
/// One array modifier inside [`MODIFIERS`].
pub const ARRAY_MODIFIER: &str = "ArrayModifier";

/// Compound of [`ANCHOR_X`] / [`ANCHOR_Y`].
pub const ANCHOR: &str = "Anchor";
/// Compound of [`POSITION_X`] / [`POSITION_Y`].
pub const POSITION: &str = "Position";
/// Compound of [`SCALE_X`] / [`SCALE_Y`].
pub const SCALE: &str = "Scale";

/// Anchor x component.
pub const ANCHOR_X: &str = "AnchorX";
/// Anchor y component.
pub const ANCHOR_Y: &str = "AnchorY";
/// Position x component.
pub const POSITION_X: &str = "PositionX";
/// Position y component.
pub const POSITION_Y: &str = "PositionY";
/// Horizontal scale factor.
pub const SCALE_X: &str = "ScaleX";
/// Vertical scale factor.
pub const SCALE_Y: &str = "ScaleY";
/// Rotation in degrees.
pub const ROTATION: &str = "Rotation";
/// Layer opacity in `0..=1`.
pub const OPACITY: &str = "Opacity";

/// Array-modifier instance count.
pub const COUNT: &str = "Count";
/// Compound of [`ORIGIN_X`] / [`ORIGIN_Y`].
pub const ORIGIN: &str = "Origin";
/// Origin x component.
pub const ORIGIN_X: &str = "OriginX";
/// Origin y component.
pub const ORIGIN_Y: &str = "OriginY";
/// Pivot behavior, see [`crate::OriginBehavior`].
pub const ORIGIN_BEHAVIOR: &str = "OriginBehavior";
/// Composition policy, see [`crate::TransformBehavior`].
pub const TRANSFORM_BEHAVIOR: &str = "TransformBehavior";
/// Blend factor in `0..=1` for the translate-before-rotate correction.
pub const ROTATION_CORRECTION: &str = "RotationCorrection";
