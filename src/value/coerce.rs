//! Conversions between typed values across mismatched graph edges.
//!
//! The legal `(from, to)` pairs form a fixed table. The graph-editing surface queries the table
//! through [`can_connect`] and [`can_convert`]; the evaluator calls [`coerce`] on every pointer it
//! follows.

use std::collections::BTreeSet;

use serde_json::Value as Json;

use crate::foundation::core::{Rect, Rgba, Vec2};
use crate::value::types::{OriginBehavior, TransformBehavior, Value, ValueType};

/// Return `true` when an output of type `from` may feed an input of type `to`.
pub fn can_connect(from: ValueType, to: ValueType) -> bool {
    from == to
        || from == ValueType::Any
        || to == ValueType::Any
        || matches!((from, to), (ValueType::Number, ValueType::Vec2))
}

/// Every type that `value_type` can connect to or be connected from.
pub fn can_convert(value_type: ValueType) -> BTreeSet<ValueType> {
    ValueType::ALL
        .into_iter()
        .filter(|&other| can_connect(value_type, other) || can_connect(other, value_type))
        .collect()
}

/// Convert `value` declared as `from` into a value of type `to`.
///
/// Returns `None` when the pair is not legal or structural parsing of an `Any` payload fails.
/// Never panics.
pub fn coerce(from: ValueType, to: ValueType, value: &Value) -> Option<Value> {
    if from == to || to == ValueType::Any {
        return Some(value.clone());
    }

    match (from, to) {
        (ValueType::Number, ValueType::Vec2) => {
            let n = match value {
                Value::Number(n) => *n,
                Value::Any(json) => json_number(json)?,
                _ => return None,
            };
            Some(Value::Vec2(Vec2::new(n, n)))
        }
        (ValueType::Any, target) => parse_any(value, target),
        _ => None,
    }
}

fn parse_any(value: &Value, target: ValueType) -> Option<Value> {
    if value.value_type() == target {
        return Some(value.clone());
    }
    let Value::Any(json) = value else {
        return None;
    };

    match target {
        ValueType::Any => Some(value.clone()),
        ValueType::Number => json_number(json).map(Value::Number),
        ValueType::Vec2 => json_vec2(json).map(Value::Vec2),
        ValueType::Rect => json_rect(json).map(Value::Rect),
        ValueType::Rgba => json_rgba(json).map(Value::Rgba),
        ValueType::Bool => json.as_bool().map(Value::Bool),
        ValueType::OriginBehavior => json
            .as_str()
            .and_then(OriginBehavior::parse)
            .map(Value::OriginBehavior),
        ValueType::TransformBehavior => json
            .as_str()
            .and_then(TransformBehavior::parse)
            .map(Value::TransformBehavior),
    }
}

fn json_number(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn json_numbers<const N: usize>(items: &[Json]) -> Option<[f64; N]> {
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = json_number(item)?;
    }
    Some(out)
}

fn json_field(obj: &serde_json::Map<String, Json>, key: &str) -> Option<f64> {
    obj.get(key).and_then(json_number)
}

fn json_vec2(json: &Json) -> Option<Vec2> {
    match json {
        Json::Array(items) => json_numbers::<2>(items).map(|[x, y]| Vec2::new(x, y)),
        Json::Object(obj) => Some(Vec2::new(json_field(obj, "x")?, json_field(obj, "y")?)),
        _ => None,
    }
}

fn json_rect(json: &Json) -> Option<Rect> {
    let [left, top, width, height] = match json {
        Json::Array(items) => json_numbers::<4>(items)?,
        Json::Object(obj) => [
            json_field(obj, "left")?,
            json_field(obj, "top")?,
            json_field(obj, "width")?,
            json_field(obj, "height")?,
        ],
        _ => return None,
    };
    Some(Rect::new(left, top, left + width, top + height))
}

fn json_rgba(json: &Json) -> Option<Rgba> {
    match json {
        Json::Array(items) if items.len() == 3 => {
            json_numbers::<3>(items).map(|[r, g, b]| Rgba::new(r, g, b, 1.0))
        }
        Json::Array(items) => json_numbers::<4>(items).map(|[r, g, b, a]| Rgba::new(r, g, b, a)),
        Json::Object(obj) => Some(Rgba::new(
            json_field(obj, "r")?,
            json_field(obj, "g")?,
            json_field(obj, "b")?,
            json_field(obj, "a").unwrap_or(1.0),
        )),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/value/coerce.rs"]
mod tests;
