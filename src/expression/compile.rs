use crate::expression::ast::{BinaryOp, Expr, Lit, Stmt, UnaryOp};
use crate::expression::bytecode::{BuiltinId, BytecodeProgram, ConstVal, Op};
use crate::expression::error::ExprError;
use crate::expression::parser::parse_program;

pub(crate) fn compile_source(src: &str) -> Result<BytecodeProgram, ExprError> {
    let stmts = parse_program(src)?;
    lower_program(&stmts)
}

pub(crate) fn lower_program(stmts: &[Stmt]) -> Result<BytecodeProgram, ExprError> {
    let mut p = BytecodeProgram::new();
    for stmt in stmts {
        match stmt {
            Stmt::Assign { name, value } => {
                lower_expr(&mut p, value)?;
                let slot = p.slot(name);
                p.ops.push(Op::Store(slot));
            }
            Stmt::Expr(e) => {
                lower_expr(&mut p, e)?;
                p.ops.push(Op::Yield);
            }
        }
    }
    Ok(p)
}

fn lower_expr(p: &mut BytecodeProgram, e: &Expr) -> Result<(), ExprError> {
    match e {
        Expr::Lit(Lit::F64(v)) => {
            let idx = p.push_const(ConstVal::F64(*v));
            p.ops.push(Op::PushConst(idx));
        }
        Expr::Lit(Lit::Bool(v)) => {
            let idx = p.push_const(ConstVal::Bool(*v));
            p.ops.push(Op::PushConst(idx));
        }
        Expr::Var(name) => {
            let slot = p.slot(name);
            p.ops.push(Op::Load(slot));
        }
        Expr::Vector(items) => {
            let n = u8::try_from(items.len())
                .map_err(|_| ExprError::new(0, "vector literal has too many entries"))?;
            if n == 0 {
                return Err(ExprError::new(0, "empty vector literal"));
            }
            for item in items {
                lower_expr(p, item)?;
            }
            p.ops.push(Op::MakeVector(n));
        }
        Expr::Unary { op, expr } => {
            lower_expr(p, expr)?;
            p.ops.push(match op {
                UnaryOp::Neg => Op::Neg,
                UnaryOp::Not => Op::Not,
            });
        }
        Expr::Binary { op, left, right } => {
            lower_expr(p, left)?;
            lower_expr(p, right)?;
            p.ops.push(match op {
                BinaryOp::Add => Op::Add,
                BinaryOp::Sub => Op::Sub,
                BinaryOp::Mul => Op::Mul,
                BinaryOp::Div => Op::Div,
                BinaryOp::Mod => Op::Mod,
                BinaryOp::Pow => Op::Pow,
                BinaryOp::Eq => Op::Eq,
                BinaryOp::Ne => Op::Ne,
                BinaryOp::Lt => Op::Lt,
                BinaryOp::Le => Op::Le,
                BinaryOp::Gt => Op::Gt,
                BinaryOp::Ge => Op::Ge,
                BinaryOp::And => Op::And,
                BinaryOp::Or => Op::Or,
            });
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            lower_expr(p, cond)?;
            lower_expr(p, then)?;
            lower_expr(p, otherwise)?;
            p.ops.push(Op::Select);
        }
        Expr::Call { func, args } => {
            let Some(id) = BuiltinId::from_name(func) else {
                return Err(ExprError::new(0, format!("unknown function '{func}'")));
            };
            if args.len() != id.arity() as usize {
                return Err(ExprError::new(
                    0,
                    format!(
                        "{func} expects {} arg(s), got {}",
                        id.arity(),
                        args.len()
                    ),
                ));
            }
            for a in args {
                lower_expr(p, a)?;
            }
            p.ops.push(Op::CallBuiltin {
                id,
                argc: id.arity(),
            });
        }
        Expr::Index { base, index } => {
            lower_expr(p, base)?;
            lower_expr(p, index)?;
            p.ops.push(Op::Index);
        }
        Expr::Component { base, component } => {
            lower_expr(p, base)?;
            p.ops.push(Op::Component(*component));
        }
    }
    Ok(())
}
