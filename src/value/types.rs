use crate::foundation::core::{Rect, Rgba, Vec2};

/// Declared type of a property, node input or node output.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Untyped; accepts anything and is parsed structurally on demand.
    Any,
    /// Scalar number.
    Number,
    /// 2D vector.
    Vec2,
    /// Axis-aligned rectangle.
    Rect,
    /// RGBA color.
    Rgba,
    /// Boolean flag.
    Bool,
    /// Array-modifier pivot behavior.
    OriginBehavior,
    /// Array-modifier composition policy.
    TransformBehavior,
}

impl ValueType {
    /// Every value type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Any,
        Self::Number,
        Self::Vec2,
        Self::Rect,
        Self::Rgba,
        Self::Bool,
        Self::OriginBehavior,
        Self::TransformBehavior,
    ];
}

/// Where array-modifier instances pivot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginBehavior {
    /// Pivot around the shape's own anchor, offset by the modifier origin.
    Relative,
    /// Pivot around the modifier origin in composition space.
    Absolute,
}

impl OriginBehavior {
    /// Parse the canonical snake_case name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "relative" => Some(Self::Relative),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

/// Array-modifier index-transform composition policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformBehavior {
    /// Every field accumulates across instances.
    Recursive,
    /// Fields driven by a per-index computed source are absolute per index.
    AbsoluteForComputed,
}

impl TransformBehavior {
    /// Parse the canonical snake_case name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "recursive" => Some(Self::Recursive),
            "absolute_for_computed" => Some(Self::AbsoluteForComputed),
            _ => None,
        }
    }
}

/// A concrete typed value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Untyped payload, parsed structurally when coerced.
    Any(serde_json::Value),
    /// Scalar number.
    Number(f64),
    /// 2D vector.
    Vec2(Vec2),
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// RGBA color.
    Rgba(Rgba),
    /// Boolean flag.
    Bool(bool),
    /// Array-modifier pivot behavior.
    OriginBehavior(OriginBehavior),
    /// Array-modifier composition policy.
    TransformBehavior(TransformBehavior),
}

impl Value {
    /// The natural type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Any(_) => ValueType::Any,
            Self::Number(_) => ValueType::Number,
            Self::Vec2(_) => ValueType::Vec2,
            Self::Rect(_) => ValueType::Rect,
            Self::Rgba(_) => ValueType::Rgba,
            Self::Bool(_) => ValueType::Bool,
            Self::OriginBehavior(_) => ValueType::OriginBehavior,
            Self::TransformBehavior(_) => ValueType::TransformBehavior,
        }
    }

    /// Zero value for a declared type, used to seed unconnected inputs.
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Any => Self::Any(serde_json::Value::Null),
            ValueType::Number => Self::Number(0.0),
            ValueType::Vec2 => Self::Vec2(Vec2::ZERO),
            ValueType::Rect => Self::Rect(Rect::ZERO),
            ValueType::Rgba => Self::Rgba(Rgba::black()),
            ValueType::Bool => Self::Bool(false),
            ValueType::OriginBehavior => Self::OriginBehavior(OriginBehavior::Relative),
            ValueType::TransformBehavior => Self::TransformBehavior(TransformBehavior::Recursive),
        }
    }

    /// Scalar payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector payload, if this is a vector.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Color payload, if this is a color.
    pub fn as_rgba(&self) -> Option<Rgba> {
        match self {
            Self::Rgba(v) => Some(*v),
            _ => None,
        }
    }

    /// Rect payload, if this is a rect.
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Rgba> for Value {
    fn from(v: Rgba) -> Self {
        Self::Rgba(v)
    }
}

impl From<Rect> for Value {
    fn from(v: Rect) -> Self {
        Self::Rect(v)
    }
}
