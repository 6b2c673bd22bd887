//! Per-kind compute functions: resolved inputs in, outputs out.

use crate::expression::{ExprScope, ExprValue};
use crate::flow::env::FlowEnv;
use crate::flow::error::CompositionErrorKind;
use crate::flow::graph::{FlowNode, FlowNodeKind};
use crate::foundation::core::{Rect, Rgba, Vec2, lerp, lerp_vec2};
use crate::scene::model::Scene;
use crate::value::coerce::coerce;
use crate::value::types::{Value, ValueType};

type ComputeResult = Result<Vec<Value>, CompositionErrorKind>;

/// Run `node` on already-coerced `inputs`.
///
/// `property_output` is handled by the evaluator and yields no outputs here.
pub(crate) fn compute_node(
    scene: &Scene,
    node: &FlowNode,
    inputs: &[Value],
    env: &dyn FlowEnv,
) -> ComputeResult {
    match &node.kind {
        FlowNodeKind::NumInput
        | FlowNodeKind::ColorInput
        | FlowNodeKind::RectInput
        | FlowNodeKind::Vec2Input => Ok(vec![arg(inputs, 0)?.clone()]),

        FlowNodeKind::PropertyInput { property_id } => {
            let leaves = scene.leaves(property_id);
            if leaves.is_empty() {
                return Err(CompositionErrorKind::MissingProperty {
                    property_id: property_id.clone(),
                });
            }
            if leaves.len() != node.outputs.len() {
                return Err(CompositionErrorKind::shape(format!(
                    "property '{property_id}' has {} leaves, node declares {} outputs",
                    leaves.len(),
                    node.outputs.len()
                )));
            }
            let mut out = Vec::with_capacity(leaves.len());
            for (i, (leaf, decl)) in leaves.iter().zip(&node.outputs).enumerate() {
                let v = env
                    .value(&leaf.id)
                    .ok_or_else(|| CompositionErrorKind::MissingProperty {
                        property_id: leaf.id.clone(),
                    })?;
                let from = v.value_type();
                out.push(coerce(from, decl.value_type, &v).ok_or(
                    CompositionErrorKind::Coercion {
                        input: i,
                        from,
                        to: decl.value_type,
                    },
                )?);
            }
            Ok(out)
        }

        FlowNodeKind::PropertyOutput { .. } => Ok(Vec::new()),

        FlowNodeKind::ArrayModifierIndex => {
            Ok(vec![Value::Number(env.array_index().unwrap_or(0) as f64)])
        }

        FlowNodeKind::Composition { composition_id } => {
            let info = env.composition(composition_id.as_ref()).ok_or_else(|| {
                CompositionErrorKind::shape("composition node has no composition in scope")
            })?;
            Ok(vec![
                Value::Number(info.frame_index),
                Value::Number(f64::from(info.length)),
                Value::Vec2(info.size),
            ])
        }

        FlowNodeKind::Expr { expression } => run_expression(node, expression, inputs, env),

        FlowNodeKind::DegToRad => Ok(vec![Value::Number(num(inputs, 0)?.to_radians())]),
        FlowNodeKind::RadToDeg => Ok(vec![Value::Number(num(inputs, 0)?.to_degrees())]),
        FlowNodeKind::NumCap => {
            let (v, lo, hi) = (num(inputs, 0)?, num(inputs, 1)?, num(inputs, 2)?);
            Ok(vec![Value::Number(v.max(lo).min(hi))])
        }
        FlowNodeKind::NumLerp => Ok(vec![Value::Number(lerp(
            num(inputs, 0)?,
            num(inputs, 1)?,
            num(inputs, 2)?,
        ))]),
        FlowNodeKind::NumAdd => Ok(vec![Value::Number(num(inputs, 0)? + num(inputs, 1)?)]),
        FlowNodeKind::NumMultiply => Ok(vec![Value::Number(num(inputs, 0)? * num(inputs, 1)?)]),

        FlowNodeKind::Vec2Add => Ok(vec![Value::Vec2(vec2(inputs, 0)? + vec2(inputs, 1)?)]),
        FlowNodeKind::Vec2Lerp => Ok(vec![Value::Vec2(lerp_vec2(
            vec2(inputs, 0)?,
            vec2(inputs, 1)?,
            num(inputs, 2)?,
        ))]),
        FlowNodeKind::Vec2Factors => {
            let v = vec2(inputs, 0)?;
            Ok(vec![Value::Number(v.x), Value::Number(v.y)])
        }
        FlowNodeKind::Vec2FromFactors => Ok(vec![Value::Vec2(Vec2::new(
            num(inputs, 0)?,
            num(inputs, 1)?,
        ))]),

        FlowNodeKind::ColorToRgbaFactors => {
            let c = rgba(inputs, 0)?;
            Ok(c.to_array().into_iter().map(Value::Number).collect())
        }
        FlowNodeKind::ColorFromRgbaFactors => Ok(vec![Value::Rgba(
            Rgba::new(
                num(inputs, 0)?,
                num(inputs, 1)?,
                num(inputs, 2)?,
                num(inputs, 3)?,
            )
            .clamped(),
        )]),

        FlowNodeKind::RectTranslate => Ok(vec![Value::Rect(rect(inputs, 0)? + vec2(inputs, 1)?)]),

        FlowNodeKind::Unknown => Err(CompositionErrorKind::UnknownNodeKind),
    }
}

fn arg(inputs: &[Value], i: usize) -> Result<&Value, CompositionErrorKind> {
    inputs
        .get(i)
        .ok_or_else(|| CompositionErrorKind::shape(format!("missing input {i}")))
}

fn typed<T>(
    inputs: &[Value],
    i: usize,
    expected: ValueType,
    get: impl FnOnce(&Value) -> Option<T>,
) -> Result<T, CompositionErrorKind> {
    let v = arg(inputs, i)?;
    get(v).ok_or_else(|| {
        CompositionErrorKind::shape(format!(
            "input {i}: expected {expected:?}, got {:?}",
            v.value_type()
        ))
    })
}

fn num(inputs: &[Value], i: usize) -> Result<f64, CompositionErrorKind> {
    typed(inputs, i, ValueType::Number, Value::as_number)
}

fn vec2(inputs: &[Value], i: usize) -> Result<Vec2, CompositionErrorKind> {
    typed(inputs, i, ValueType::Vec2, Value::as_vec2)
}

fn rgba(inputs: &[Value], i: usize) -> Result<Rgba, CompositionErrorKind> {
    typed(inputs, i, ValueType::Rgba, Value::as_rgba)
}

fn rect(inputs: &[Value], i: usize) -> Result<Rect, CompositionErrorKind> {
    typed(inputs, i, ValueType::Rect, Value::as_rect)
}

fn run_expression(
    node: &FlowNode,
    source: &str,
    inputs: &[Value],
    env: &dyn FlowEnv,
) -> ComputeResult {
    let mut scope = ExprScope::new();
    for (i, (decl, value)) in node.inputs.iter().zip(inputs).enumerate() {
        if let Some(v) = to_expr_value(value) {
            scope.set(slot_name(&decl.name, "in", i), v);
        }
    }

    env.expressions()
        .evaluate(source, &mut scope)
        .map_err(|e| CompositionErrorKind::Expression {
            message: e.to_string(),
        })?;

    node.outputs
        .iter()
        .enumerate()
        .map(|(i, decl)| {
            let name = slot_name(&decl.name, "out", i);
            let v = scope
                .get(&name)
                .ok_or_else(|| CompositionErrorKind::Expression {
                    message: format!("output '{name}' was not assigned"),
                })?;
            from_expr_value(v, decl.value_type).ok_or_else(|| CompositionErrorKind::Expression {
                message: format!("output '{name}': cannot convert {v:?} to {:?}", decl.value_type),
            })
        })
        .collect()
}

fn slot_name(name: &str, prefix: &str, i: usize) -> String {
    if name.is_empty() {
        format!("{prefix}{i}")
    } else {
        name.to_owned()
    }
}

pub(crate) fn to_expr_value(value: &Value) -> Option<ExprValue> {
    Some(match value {
        Value::Number(n) => ExprValue::Number(*n),
        Value::Bool(b) => ExprValue::Bool(*b),
        Value::Vec2(v) => ExprValue::vector(&[v.x, v.y]),
        Value::Rect(r) => ExprValue::vector(&[r.x0, r.y0, r.width(), r.height()]),
        Value::Rgba(c) => ExprValue::vector(&c.to_array()),
        Value::Any(json) => match json {
            serde_json::Value::Number(n) => ExprValue::Number(n.as_f64()?),
            serde_json::Value::Bool(b) => ExprValue::Bool(*b),
            serde_json::Value::Array(items) => {
                let xs: Option<Vec<f64>> = items.iter().map(serde_json::Value::as_f64).collect();
                ExprValue::vector(&xs?)
            }
            _ => return None,
        },
        Value::OriginBehavior(_) | Value::TransformBehavior(_) => return None,
    })
}

pub(crate) fn from_expr_value(value: &ExprValue, target: ValueType) -> Option<Value> {
    match (target, value) {
        (ValueType::Number, ExprValue::Number(n)) => Some(Value::Number(*n)),
        (ValueType::Bool, ExprValue::Bool(b)) => Some(Value::Bool(*b)),
        (ValueType::Vec2, ExprValue::Number(n)) => Some(Value::Vec2(Vec2::new(*n, *n))),
        (ValueType::Vec2, ExprValue::Vector(v)) if v.len() == 2 => {
            Some(Value::Vec2(Vec2::new(v[0], v[1])))
        }
        (ValueType::Rect, ExprValue::Vector(v)) if v.len() == 4 => Some(Value::Rect(Rect::new(
            v[0],
            v[1],
            v[0] + v[2],
            v[1] + v[3],
        ))),
        (ValueType::Rgba, ExprValue::Vector(v)) if v.len() == 3 || v.len() == 4 => {
            let a = v.get(3).copied().unwrap_or(1.0);
            Some(Value::Rgba(Rgba::new(v[0], v[1], v[2], a)))
        }
        (ValueType::Any, ExprValue::Number(n)) => Some(Value::Any(serde_json::json!(n))),
        (ValueType::Any, ExprValue::Bool(b)) => Some(Value::Any(serde_json::json!(b))),
        (ValueType::Any, ExprValue::Vector(v)) => {
            Some(Value::Any(serde_json::json!(v.as_slice())))
        }
        _ => None,
    }
}
