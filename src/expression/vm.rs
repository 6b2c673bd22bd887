use smallvec::SmallVec;

use crate::expression::bytecode::{BuiltinId, BytecodeProgram, ConstVal, Op};
use crate::expression::error::ExprError;

/// A value flowing through an expression: scalar, boolean, or short vector.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// Scalar.
    Number(f64),
    /// Boolean, produced by comparisons and logic operators.
    Bool(bool),
    /// Vector of 1..=255 components (Vec2 / Rect / RGBA map here).
    Vector(SmallVec<[f64; 4]>),
}

impl ExprValue {
    /// Builds a vector value from a slice.
    pub fn vector(items: &[f64]) -> Self {
        Self::Vector(SmallVec::from_slice(items))
    }

    pub(crate) fn as_f64(&self) -> Result<f64, ExprError> {
        match self {
            Self::Number(v) => Ok(*v),
            other => Err(ExprError::runtime(format!("expected number, got {other:?}"))),
        }
    }

    pub(crate) fn as_bool(&self) -> Result<bool, ExprError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(ExprError::runtime(format!("expected bool, got {other:?}"))),
        }
    }
}

/// Named constants visible unless a variable with the same name is bound.
pub(crate) fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "tau" => Some(std::f64::consts::TAU),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Runs `p` with slots pre-filled by `load`. Returns the final slot table and the
/// value of the last expression statement, if any.
pub(crate) fn run_program(
    p: &BytecodeProgram,
    mut load: impl FnMut(&str) -> Option<ExprValue>,
) -> Result<(Vec<Option<ExprValue>>, Option<ExprValue>), ExprError> {
    let mut slots: Vec<Option<ExprValue>> = p
        .slots
        .iter()
        .map(|name| load(name).or_else(|| constant(name).map(ExprValue::Number)))
        .collect();
    let mut stack: Vec<ExprValue> = Vec::with_capacity(16);
    let mut result = None;

    for &op in &p.ops {
        match op {
            Op::PushConst(idx) => {
                let c = p
                    .consts
                    .get(idx.0 as usize)
                    .ok_or_else(|| ExprError::runtime("const idx out of range"))?;
                stack.push(match *c {
                    ConstVal::F64(v) => ExprValue::Number(v),
                    ConstVal::Bool(v) => ExprValue::Bool(v),
                });
            }
            Op::Load(slot) => {
                let i = slot.0 as usize;
                let v = slots.get(i).and_then(|s| s.clone()).ok_or_else(|| {
                    let name = p.slots.get(i).map(String::as_str).unwrap_or("?");
                    ExprError::runtime(format!("undefined variable '{name}'"))
                })?;
                stack.push(v);
            }
            Op::Store(slot) => {
                let v = pop(&mut stack)?;
                let cell = slots
                    .get_mut(slot.0 as usize)
                    .ok_or_else(|| ExprError::runtime("slot idx out of range"))?;
                *cell = Some(v);
            }
            Op::Yield => result = Some(pop(&mut stack)?),

            Op::MakeVector(n) => {
                let n = n as usize;
                if stack.len() < n {
                    return Err(ExprError::runtime("stack underflow"));
                }
                let mut out = SmallVec::with_capacity(n);
                for v in stack.drain(stack.len() - n..) {
                    out.push(v.as_f64()?);
                }
                stack.push(ExprValue::Vector(out));
            }
            Op::Index => {
                let index = pop(&mut stack)?.as_f64()?;
                let base = pop(&mut stack)?;
                if !index.is_finite() || index < 0.0 {
                    return Err(ExprError::runtime(format!("invalid index {index}")));
                }
                stack.push(ExprValue::Number(component(&base, index.floor() as usize)?));
            }
            Op::Component(c) => {
                let base = pop(&mut stack)?;
                stack.push(ExprValue::Number(component(&base, c as usize)?));
            }

            Op::Neg => {
                let v = pop(&mut stack)?;
                stack.push(map_numeric(v, |x| -x)?);
            }
            Op::Not => {
                let v = pop(&mut stack)?.as_bool()?;
                stack.push(ExprValue::Bool(!v));
            }
            Op::Add => bin_numeric(&mut stack, |a, b| a + b)?,
            Op::Sub => bin_numeric(&mut stack, |a, b| a - b)?,
            Op::Mul => bin_numeric(&mut stack, |a, b| a * b)?,
            Op::Div => bin_numeric(&mut stack, |a, b| a / b)?,
            Op::Mod => bin_numeric(&mut stack, |a, b| a % b)?,
            Op::Pow => bin_numeric(&mut stack, f64::powf)?,

            Op::Eq => bin_eq(&mut stack, true)?,
            Op::Ne => bin_eq(&mut stack, false)?,
            Op::Lt => bin_cmp(&mut stack, |a, b| a < b)?,
            Op::Le => bin_cmp(&mut stack, |a, b| a <= b)?,
            Op::Gt => bin_cmp(&mut stack, |a, b| a > b)?,
            Op::Ge => bin_cmp(&mut stack, |a, b| a >= b)?,

            Op::And => {
                let b = pop(&mut stack)?.as_bool()?;
                let a = pop(&mut stack)?.as_bool()?;
                stack.push(ExprValue::Bool(a && b));
            }
            Op::Or => {
                let b = pop(&mut stack)?.as_bool()?;
                let a = pop(&mut stack)?.as_bool()?;
                stack.push(ExprValue::Bool(a || b));
            }
            Op::Select => {
                let otherwise = pop(&mut stack)?;
                let then = pop(&mut stack)?;
                let cond = pop(&mut stack)?.as_bool()?;
                stack.push(if cond { then } else { otherwise });
            }

            Op::CallBuiltin { id, argc } => call_builtin(&mut stack, id, argc)?,
        }
    }

    if !stack.is_empty() {
        return Err(ExprError::runtime(format!(
            "stack has {} values at end of program",
            stack.len()
        )));
    }
    Ok((slots, result))
}

fn pop(stack: &mut Vec<ExprValue>) -> Result<ExprValue, ExprError> {
    stack.pop().ok_or_else(|| ExprError::runtime("stack underflow"))
}

fn component(base: &ExprValue, i: usize) -> Result<f64, ExprError> {
    match base {
        ExprValue::Vector(v) => v.get(i).copied().ok_or_else(|| {
            ExprError::runtime(format!("index {i} out of range for vector of {}", v.len()))
        }),
        other => Err(ExprError::runtime(format!("cannot index {other:?}"))),
    }
}

fn map_numeric(v: ExprValue, f: impl Fn(f64) -> f64) -> Result<ExprValue, ExprError> {
    match v {
        ExprValue::Number(x) => Ok(ExprValue::Number(f(x))),
        ExprValue::Vector(xs) => Ok(ExprValue::Vector(xs.into_iter().map(f).collect())),
        ExprValue::Bool(_) => Err(ExprError::runtime("expected number or vector, got bool")),
    }
}

/// Component-wise combination; a scalar on either side is broadcast.
fn zip_numeric(
    a: ExprValue,
    b: ExprValue,
    f: impl Fn(f64, f64) -> f64,
) -> Result<ExprValue, ExprError> {
    match (a, b) {
        (ExprValue::Number(a), ExprValue::Number(b)) => Ok(ExprValue::Number(f(a, b))),
        (ExprValue::Vector(a), ExprValue::Number(b)) => {
            Ok(ExprValue::Vector(a.into_iter().map(|x| f(x, b)).collect()))
        }
        (ExprValue::Number(a), ExprValue::Vector(b)) => {
            Ok(ExprValue::Vector(b.into_iter().map(|y| f(a, y)).collect()))
        }
        (ExprValue::Vector(a), ExprValue::Vector(b)) => {
            if a.len() != b.len() {
                return Err(ExprError::runtime(format!(
                    "vector length mismatch: {} vs {}",
                    a.len(),
                    b.len()
                )));
            }
            Ok(ExprValue::Vector(
                a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect(),
            ))
        }
        (a, b) => Err(ExprError::runtime(format!(
            "expected numeric operands, got {a:?} and {b:?}"
        ))),
    }
}

fn bin_numeric(stack: &mut Vec<ExprValue>, f: impl Fn(f64, f64) -> f64) -> Result<(), ExprError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    stack.push(zip_numeric(a, b, f)?);
    Ok(())
}

fn bin_cmp(stack: &mut Vec<ExprValue>, f: impl FnOnce(f64, f64) -> bool) -> Result<(), ExprError> {
    let b = pop(stack)?.as_f64()?;
    let a = pop(stack)?.as_f64()?;
    stack.push(ExprValue::Bool(f(a, b)));
    Ok(())
}

fn bin_eq(stack: &mut Vec<ExprValue>, is_eq: bool) -> Result<(), ExprError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    let res = match (&a, &b) {
        (ExprValue::Bool(_), ExprValue::Bool(_))
        | (ExprValue::Number(_), ExprValue::Number(_))
        | (ExprValue::Vector(_), ExprValue::Vector(_)) => a == b,
        _ => {
            return Err(ExprError::runtime(format!(
                "cannot compare {a:?} with {b:?}"
            )));
        }
    };
    stack.push(ExprValue::Bool(if is_eq { res } else { !res }));
    Ok(())
}

fn call_builtin(stack: &mut Vec<ExprValue>, id: BuiltinId, argc: u8) -> Result<(), ExprError> {
    if stack.len() < argc as usize {
        return Err(ExprError::runtime("stack underflow in builtin call"));
    }

    let out = match id {
        BuiltinId::Abs => map_numeric(pop(stack)?, f64::abs)?,
        BuiltinId::Sin => map_numeric(pop(stack)?, f64::sin)?,
        BuiltinId::Cos => map_numeric(pop(stack)?, f64::cos)?,
        BuiltinId::Tan => map_numeric(pop(stack)?, f64::tan)?,
        BuiltinId::Asin => map_numeric(pop(stack)?, f64::asin)?,
        BuiltinId::Acos => map_numeric(pop(stack)?, f64::acos)?,
        BuiltinId::Atan => map_numeric(pop(stack)?, f64::atan)?,
        BuiltinId::Sqrt => map_numeric(pop(stack)?, f64::sqrt)?,
        BuiltinId::Exp => map_numeric(pop(stack)?, f64::exp)?,
        BuiltinId::Ln => map_numeric(pop(stack)?, f64::ln)?,
        BuiltinId::Log10 => map_numeric(pop(stack)?, f64::log10)?,
        BuiltinId::Floor => map_numeric(pop(stack)?, f64::floor)?,
        BuiltinId::Ceil => map_numeric(pop(stack)?, f64::ceil)?,
        BuiltinId::Round => map_numeric(pop(stack)?, f64::round)?,
        BuiltinId::Atan2 => {
            let x = pop(stack)?;
            let y = pop(stack)?;
            zip_numeric(y, x, f64::atan2)?
        }
        BuiltinId::Pow => {
            let b = pop(stack)?;
            let a = pop(stack)?;
            zip_numeric(a, b, f64::powf)?
        }
        BuiltinId::Min => {
            let b = pop(stack)?;
            let a = pop(stack)?;
            zip_numeric(a, b, f64::min)?
        }
        BuiltinId::Max => {
            let b = pop(stack)?;
            let a = pop(stack)?;
            zip_numeric(a, b, f64::max)?
        }
        BuiltinId::Clamp => {
            let hi = pop(stack)?.as_f64()?;
            let lo = pop(stack)?.as_f64()?;
            if lo > hi {
                return Err(ExprError::runtime(format!("clamp bounds inverted: {lo} > {hi}")));
            }
            map_numeric(pop(stack)?, |x| x.clamp(lo, hi))?
        }
        BuiltinId::Lerp => {
            let t = pop(stack)?.as_f64()?;
            let b = pop(stack)?;
            let a = pop(stack)?;
            zip_numeric(a, b, |a, b| a + (b - a) * t)?
        }
    };

    stack.push(out);
    Ok(())
}
