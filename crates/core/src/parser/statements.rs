use super::Parser;
use crate::ast::{AssignOp, Block, Expr, Stmt, TemplateOption};
use crate::error::Diagnostic;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    pub(super) fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        match self.peek().clone() {
            Token::Word(w) => match w.as_str() {
                "namespace" => self.parse_namespace(),
                "import" => self.parse_import(),
                "export" => self.parse_export(),
                "for" => self.parse_for(),
                "if" => self.parse_if(),
                _ if self.peek_at(1) == &Token::LParen => self.parse_constraint(),
                _ => self.parse_template_assign(),
            },
            Token::Continuous => self.parse_constraint(),
            Token::Var(_) if assign_op(self.peek_at(1)).is_some() => self.parse_assign(),
            Token::LBrace if !self.set_literal_ahead() => {
                let block = self.parse_block()?;
                Ok(Stmt::Block(block))
            }
            _ => self.parse_template_assign(),
        }
    }

    /// A statement opening with `{` is a template target when the matching
    /// `}` is followed by `:`.
    fn set_literal_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = 0usize;
        loop {
            match self.peek_at(i) {
                Token::Eof => return false,
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_at(i + 1) == &Token::Colon;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_namespace(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        self.advance();
        let name = self.take_word()?;
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::Namespace { name, pos })
    }

    fn parse_import(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        self.advance();
        let mut id = self.take_word()?;
        if self.peek() == &Token::Dot && self.peek_at(1) == &Token::Star {
            self.advance();
            self.advance();
            id.push_str(".*");
        }
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::Import { id, pos })
    }

    fn parse_export(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        self.advance();
        let mut targets = vec![self.parse_expr()?];
        while self.peek() == &Token::Comma {
            self.advance();
            targets.push(self.parse_expr()?);
        }
        let scopes = if self.is_word("to") {
            self.advance();
            let mut scopes = vec![self.parse_scope()?];
            while self.peek() == &Token::Comma {
                self.advance();
                scopes.push(self.parse_scope()?);
            }
            Some(scopes)
        } else {
            None
        };
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::Export {
            targets,
            scopes,
            pos,
        })
    }

    /// `*`, `a.b` or `a.b.*`
    fn parse_scope(&mut self) -> Result<String, Diagnostic> {
        if self.peek() == &Token::Star {
            self.advance();
            return Ok("*".to_owned());
        }
        let mut scope = self.take_word()?;
        if self.peek() == &Token::Dot && self.peek_at(1) == &Token::Star {
            self.advance();
            self.advance();
            scope.push_str(".*");
        }
        Ok(scope)
    }

    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        self.advance();
        let var = self.take_var()?;
        if !self.is_word("in") {
            return Err(self.err(format!("expected 'in', got {:?}", self.peek())));
        }
        self.advance();
        let collection = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            var,
            collection,
            body,
            pos,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        self.advance();
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;
        let otherwise = if self.is_word("else") {
            self.advance();
            if self.is_word("if") {
                let nested_pos = self.cur_pos();
                let nested = self.parse_if()?;
                Some(Block {
                    stmts: vec![nested],
                    pos: nested_pos,
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
            pos,
        })
    }

    fn parse_constraint(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        let continuous = self.peek() == &Token::Continuous;
        if continuous {
            self.advance();
        }
        let keyword = self.take_word()?;
        self.expect(Token::LParen, "(")?;
        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
            args.push(self.parse_expr()?);
            while self.peek() == &Token::Comma {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RParen, ")")?;
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::Constraint {
            keyword,
            args,
            continuous,
            pos,
        })
    }

    fn parse_assign(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        let label = self.take_var()?;
        let op = match assign_op(self.peek()) {
            Some(op) => op,
            None => return Err(self.err(format!("expected '=', got {:?}", self.peek()))),
        };
        self.advance();
        let value = self.parse_expr()?;
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::Assign {
            label,
            op,
            value,
            pos,
        })
    }

    fn parse_template_assign(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.cur_pos();
        let target = self.parse_primary()?;
        self.expect(Token::Colon, ":")?;
        let template = self.take_word()?;
        let mut options = Vec::new();
        if self.peek() == &Token::Lt {
            self.advance();
            loop {
                let opt_pos = self.cur_pos();
                let key = self.take_word()?;
                let value = if self.peek() == &Token::Assign {
                    self.advance();
                    Some(self.parse_option_value()?)
                } else {
                    None
                };
                options.push(TemplateOption {
                    key,
                    value,
                    pos: opt_pos,
                });
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(Token::Gt, ">")?;
        }
        self.expect(Token::Semi, ";")?;
        Ok(Stmt::TemplateAssign {
            target,
            template,
            options,
            pos,
        })
    }

    fn parse_option_value(&mut self) -> Result<Expr, Diagnostic> {
        let pos = self.cur_pos();
        match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                Ok(Expr::Str { value: w, pos })
            }
            Token::Number(_) | Token::Str(_) | Token::Var(_) => self.parse_primary(),
            Token::Minus => self.parse_unary(),
            other => Err(self.err(format!("expected an option value, got {:?}", other))),
        }
    }
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Assign => Some(AssignOp::Set),
        Token::PlusAssign => Some(AssignOp::Add),
        Token::MinusAssign => Some(AssignOp::Sub),
        Token::StarAssign => Some(AssignOp::Mul),
        Token::SlashAssign => Some(AssignOp::Div),
        Token::PercentAssign => Some(AssignOp::Rem),
        _ => None,
    }
}
