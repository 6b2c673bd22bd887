use crate::expression::ast::{BinaryOp, Expr, Lit, Stmt, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Span, Token, TokenKind, lex};

/// Deepest expression tree the parser builds.
const MAX_DEPTH: usize = 1024;
/// Deepest recursive nesting (parentheses, unary operators, powers, ternaries).
const MAX_NESTING: usize = 64;

/// Parses a whole script: a sequence of statements separated by `;` or newlines.
pub(crate) fn parse_program(src: &str) -> Result<Vec<Stmt>, ExprError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nesting: 0,
    };
    let mut out = Vec::new();

    loop {
        while p.consume(TokenKind::Semi) {}
        if p.peek().kind == TokenKind::Eof {
            break;
        }
        out.push(p.parse_stmt()?);
        if p.peek().kind != TokenKind::Eof {
            p.expect(TokenKind::Semi)?;
        }
    }

    Ok(out)
}

/// Parses a single expression with nothing trailing it.
#[cfg(test)]
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nesting: 0,
    };
    let e = p.parse_ternary()?;
    p.expect(TokenKind::Eof)?;
    Ok(e)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        // Eof is the last token; never step past it.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::new(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::new(
                self.span().start,
                format!("expression nests deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn nest(&mut self) -> Result<(), ExprError> {
        if self.nesting >= MAX_NESTING {
            return Err(ExprError::new(
                self.span().start,
                format!("expression nests deeper than {MAX_NESTING} levels"),
            ));
        }
        self.nesting += 1;
        self.descend()
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ExprError> {
        if let TokenKind::Ident(name) = &self.peek().kind
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::Assign)
        {
            let name = name.clone();
            self.bump();
            self.bump();
            let value = self.parse_ternary()?;
            return Ok(Stmt::Assign { name, value });
        }
        Ok(Stmt::Expr(self.parse_ternary()?))
    }

    fn parse_ternary(&mut self) -> Result<Expr, ExprError> {
        let mark = (self.depth, self.nesting);
        self.nest()?;
        let cond = self.parse_or()?;
        let e = if self.consume(TokenKind::Question) {
            let then = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let otherwise = self.parse_ternary()?;
            Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            cond
        };
        (self.depth, self.nesting) = mark;
        Ok(e)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_and()?;
        while self.consume(TokenKind::OrOr) {
            self.descend()?;
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_equality()?;
        while self.consume(TokenKind::AndAnd) {
            self.descend()?;
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_comparison()?;
        loop {
            let op = if self.consume(TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.consume(TokenKind::Ne) {
                BinaryOp::Ne
            } else {
                break;
            };
            self.descend()?;
            let r = self.parse_comparison()?;
            e = binary(op, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_term()?;
        loop {
            let op = if self.consume(TokenKind::Lt) {
                BinaryOp::Lt
            } else if self.consume(TokenKind::Le) {
                BinaryOp::Le
            } else if self.consume(TokenKind::Gt) {
                BinaryOp::Gt
            } else if self.consume(TokenKind::Ge) {
                BinaryOp::Ge
            } else {
                break;
            };
            self.descend()?;
            let r = self.parse_term()?;
            e = binary(op, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_factor()?;
        loop {
            let op = if self.consume(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.consume(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            self.descend()?;
            let r = self.parse_factor()?;
            e = binary(op, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_unary()?;
        loop {
            let op = if self.consume(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.consume(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.consume(TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            self.descend()?;
            let r = self.parse_unary()?;
            e = binary(op, e, r);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.consume(TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.consume(TokenKind::Bang) {
            UnaryOp::Not
        } else {
            return self.parse_power();
        };
        let mark = (self.depth, self.nesting);
        self.nest()?;
        let e = self.parse_unary()?;
        (self.depth, self.nesting) = mark;
        Ok(Expr::Unary {
            op,
            expr: Box::new(e),
        })
    }

    // Right-associative; binds tighter than unary minus (`-2^2 == -4`).
    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_postfix()?;
        if self.consume(TokenKind::Caret) {
            let mark = (self.depth, self.nesting);
            self.nest()?;
            let exp = self.parse_unary()?;
            (self.depth, self.nesting) = mark;
            return Ok(binary(BinaryOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mark = self.depth;
        let mut e = self.parse_primary()?;

        loop {
            if matches!(
                self.peek().kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.descend()?;
            }
            if self.consume(TokenKind::Dot) {
                let t = self.bump().clone();
                let component = match &t.kind {
                    TokenKind::Ident(s) => component_index(s).ok_or_else(|| {
                        ExprError::new(t.span.start, format!("unknown component '.{s}'"))
                    })?,
                    other => {
                        return Err(ExprError::new(
                            t.span.start,
                            format!("expected component after '.', found {other:?}"),
                        ));
                    }
                };
                e = Expr::Component {
                    base: Box::new(e),
                    component,
                };
                continue;
            }

            if self.consume(TokenKind::LBracket) {
                let index = self.parse_ternary()?;
                self.expect(TokenKind::RBracket)?;
                e = Expr::Index {
                    base: Box::new(e),
                    index: Box::new(index),
                };
                continue;
            }

            if self.peek().kind == TokenKind::LParen {
                let at = self.span().start;
                self.bump();
                let args = self.parse_list(TokenKind::RParen)?;
                let Expr::Var(func) = e else {
                    return Err(ExprError::new(at, "call target must be an identifier"));
                };
                e = Expr::Call { func, args };
                continue;
            }

            break;
        }

        self.depth = mark;
        Ok(e)
    }

    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.consume(close.clone()) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_ternary()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Lit(Lit::F64(v))),
            TokenKind::True => Ok(Expr::Lit(Lit::Bool(true))),
            TokenKind::False => Ok(Expr::Lit(Lit::Bool(false))),
            TokenKind::Ident(s) => Ok(Expr::Var(s)),
            TokenKind::LParen => {
                let e = self.parse_ternary()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => Ok(Expr::Vector(self.parse_list(TokenKind::RBracket)?)),
            other => Err(ExprError::new(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn component_index(name: &str) -> Option<u8> {
    match name {
        "x" | "r" => Some(0),
        "y" | "g" => Some(1),
        "z" | "b" => Some(2),
        "w" | "a" => Some(3),
        _ => None,
    }
}
