//! Propel is a per-frame property evaluation engine for motion graphics scenes.
//!
//! Given an immutable [`Scene`] snapshot it resolves, for one composition at one frame:
//!
//! - keyframed and static property values ([`Timeline::value_at`])
//! - user-authored flow graphs that rewrite computed values ([`evaluate_graph`])
//! - layer and array-modifier instance transforms ([`compose_index_transforms`])
//! - nested sub-compositions, once per instance
//!
//! [`Evaluator::eval_frame`] ties these together into a [`FrameOutput`]. Separately,
//! [`PerformableRegistry`] classifies property changes into the cheapest renderer action.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod array_modifier;
pub(crate) mod eval;
pub(crate) mod expression;
pub(crate) mod flow;
pub(crate) mod perform;
/// Scene snapshot model and its structural names.
pub mod scene;
pub(crate) mod value;

pub use crate::foundation::core::{Affine, Rect, Rgba, Vec2};
pub use crate::foundation::error::{PropelError, PropelResult};
pub use crate::foundation::ids::{
    CompositionId, FlowGraphId, FlowNodeId, KeyframeId, LayerId, PropertyId, TimelineId,
};

pub use crate::animation::keyframe::{ControlPoint, Keyframe, Timeline, split_keyframes};
pub use crate::array_modifier::{
    ArrayModifierParams, ComposedInstance, ComputedFields, IndexTransform,
    compose_index_transforms, corrected, place_instances,
};
pub use crate::eval::{EvalOptions, Evaluator, FrameOutput, LayerTransforms, PropertyValue};
pub use crate::expression::{
    BuiltinExpressionEvaluator, ExprError, ExprScope, ExprValue, ExpressionEvaluator,
};
pub use crate::flow::{
    CompositionError, CompositionErrorKind, CompositionInfo, FlowEnv, FlowGraph, FlowGraphKind,
    FlowInput, FlowNode, FlowNodeKind, FlowOutput, FlowPointer, GraphOutcome, evaluate_graph,
};
pub use crate::perform::{
    ChangeDirection, ChangeSet, LayerActions, LayerFingerprint, LayerRegistry, Performable,
    PerformableRegistry, PropertyEntry, build_layer_registry,
};
pub use crate::scene::dsl::{
    SceneBuilder, array_modifier_id, array_modifier_property_id, layer_property_id,
};
pub use crate::scene::model::{
    Composition, CompoundProperty, Layer, LayerKind, Property, PropertyGroup, PropertyNode, Scene,
};
pub use crate::value::coerce::{can_connect, can_convert, coerce};
pub use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};
