use super::Parser;
use crate::ast::{BinaryOp, EnumKind, Enumeration, Expr, Pos, RangeItem, UnaryOp};
use crate::error::Diagnostic;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    // -- Expression parsing --------------------------------------

    pub(super) fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_or_expr()
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let pos = lhs.pos();
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            pos,
        }
    }

    fn parse_or_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_and_expr()?;
        while self.peek() == &Token::Or {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_equality()?;
        while self.peek() == &Token::And {
            self.advance();
            let right = self.parse_equality()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::Neq => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Lte => BinaryOp::Lte,
                Token::Gt => BinaryOp::Gt,
                Token::Gte => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    pub(super) fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let pos = self.cur_pos();
        let op = match self.peek() {
            Token::Not => UnaryOp::Not,
            Token::Hash => UnaryOp::Size,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        })
    }

    pub(super) fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let pos = self.cur_pos();
        match self.peek().clone() {
            Token::Number(raw) => {
                self.advance();
                Ok(Expr::Number { raw, pos })
            }
            Token::Str(value) => {
                self.advance();
                Ok(Expr::Str { value, pos })
            }
            Token::Var(label) => {
                self.advance();
                if self.peek() == &Token::LBracket && self.glued() {
                    return self.parse_enumeration(EnumKind::Var, label, pos);
                }
                Ok(Expr::Var { label, pos })
            }
            Token::Word(name) => {
                self.advance();
                if self.peek() == &Token::LBracket && self.glued() {
                    return self.parse_enumeration(EnumKind::Vm, name, pos);
                }
                Ok(Expr::Vm { name, pos })
            }
            Token::Node(name) => {
                self.advance();
                if self.peek() == &Token::LBracket && self.glued() {
                    return self.parse_enumeration(EnumKind::Node, name, pos);
                }
                Ok(Expr::Node { name, pos })
            }
            Token::LBrace => {
                self.advance();
                let mut items = Vec::new();
                if self.peek() != &Token::RBrace {
                    items.push(self.parse_expr()?);
                    while self.peek() == &Token::Comma {
                        self.advance();
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(Token::RBrace, "}")?;
                Ok(Expr::SetLiteral { items, pos })
            }
            Token::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(Token::RParen, ")")?;
                Ok(e)
            }
            other => Err(self.err(format!("expected an expression, got {:?}", other))),
        }
    }

    // -- Enumerations --------------------------------------------

    fn parse_enumeration(
        &mut self,
        kind: EnumKind,
        head: String,
        pos: Pos,
    ) -> Result<Expr, Diagnostic> {
        self.expect(Token::LBracket, "[")?;
        let mut items = vec![self.parse_range_item()?];
        while self.peek() == &Token::Comma {
            self.advance();
            items.push(self.parse_range_item()?);
        }
        self.expect(Token::RBracket, "]")?;
        let tail = self.parse_enumeration_tail(kind);
        Ok(Expr::Enum(Enumeration {
            kind,
            head,
            items,
            tail,
            pos,
        }))
    }

    /// The literal text glued after `]`: words and numbers, joined by
    /// `.`, or by `-` in node names.
    fn parse_enumeration_tail(&mut self, kind: EnumKind) -> String {
        let mut tail = String::new();
        while self.glued() {
            match self.peek().clone() {
                Token::Word(w) | Token::Number(w) => {
                    self.advance();
                    tail.push_str(&w);
                }
                sep @ (Token::Dot | Token::Minus) => {
                    let dash = sep == Token::Minus;
                    if (dash && kind != EnumKind::Node) || !self.glued_at(1) {
                        break;
                    }
                    match self.peek_at(1).clone() {
                        Token::Word(w) | Token::Number(w) => {
                            self.advance();
                            self.advance();
                            tail.push(if dash { '-' } else { '.' });
                            tail.push_str(&w);
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        tail
    }

    fn parse_range_item(&mut self) -> Result<RangeItem, Diagnostic> {
        let from = self.parse_range_bound()?;
        if self.peek() == &Token::DotDot {
            self.advance();
            let to = self.parse_range_bound()?;
            return Ok(RangeItem::Interval { from, to });
        }
        Ok(RangeItem::Single(from))
    }

    /// Bare words between brackets are plain text, not VM references.
    fn parse_range_bound(&mut self) -> Result<Expr, Diagnostic> {
        let pos = self.cur_pos();
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            return Ok(Expr::Str { value: w, pos });
        }
        self.parse_additive()
    }
}
