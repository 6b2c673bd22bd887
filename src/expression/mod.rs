//! Expression language used by `expr` flow nodes.
//!
//! The graph evaluator only depends on [`ExpressionEvaluator`]; the built-in
//! implementation compiles source text to a small bytecode and runs it on a
//! stack VM.

pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod compile;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod vm;

use std::collections::BTreeMap;

pub use error::ExprError;
pub use vm::ExprValue;

/// Named variables an expression reads from and writes to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExprScope {
    vars: BTreeMap<String, ExprValue>,
    last: Option<ExprValue>,
}

impl ExprScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: ExprValue) {
        self.vars.insert(name.into(), value);
    }

    /// Reads a binding.
    pub fn get(&self, name: &str) -> Option<&ExprValue> {
        self.vars.get(name)
    }

    /// Value of the last bare expression statement of the most recent evaluation.
    pub fn last(&self) -> Option<&ExprValue> {
        self.last.as_ref()
    }

    /// Iterates bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExprValue)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Evaluates expression source against a mutable scope.
///
/// Implementations must be shareable across the graph worker pool.
pub trait ExpressionEvaluator: Send + Sync {
    /// Runs `source`, leaving assigned variables in `scope`.
    fn evaluate(&self, source: &str, scope: &mut ExprScope) -> Result<(), ExprError>;
}

/// Lexer, parser, bytecode and VM shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinExpressionEvaluator;

impl ExpressionEvaluator for BuiltinExpressionEvaluator {
    fn evaluate(&self, source: &str, scope: &mut ExprScope) -> Result<(), ExprError> {
        let program = compile::compile_source(source)?;
        let (slots, last) = vm::run_program(&program, |name| scope.get(name).cloned())?;
        for (i, value) in slots.into_iter().enumerate() {
            if let Some(value) = value
                && program.is_assigned(i)
            {
                scope.set(program.slots[i].clone(), value);
            }
        }
        scope.last = last;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/mod.rs"]
mod tests;
