/// Recursive-descent parser producing the syntax tree of `crate::ast`.
/// Nothing is resolved here -- that is the evaluator's job.
use crate::ast::{Block, Pos, Stmt};
use crate::error::Diagnostic;
use crate::lexer::{Spanned, Token};

mod expressions;
mod statements;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    /// Syntax errors recovered from inside nested blocks
    errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], filename: &str) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
            errors: Vec::new(),
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn cur_pos(&self) -> Pos {
        let s = self.cur();
        Pos::new(s.line, s.column)
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// True when the current token touches the previous one (`VM[`, `]x`).
    fn glued(&self) -> bool {
        self.glued_at(0)
    }

    /// Whether the token `i` positions ahead touches the one before it.
    fn glued_at(&self, i: usize) -> bool {
        let at = self.pos + i;
        at > 0 && at < self.tokens.len() && self.tokens[at - 1].end == self.tokens[at].start
    }

    fn expect(&mut self, expected: Token, text: &str) -> Result<(), Diagnostic> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}', got {:?}", text, self.peek())))
        }
    }

    fn err(&self, msg: impl Into<String>) -> Diagnostic {
        let s = self.cur();
        Diagnostic::new(&self.filename, s.line, s.column, msg)
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    fn take_word(&mut self) -> Result<String, Diagnostic> {
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!("expected identifier, got {:?}", self.peek())))
        }
    }

    fn take_var(&mut self) -> Result<String, Diagnostic> {
        if let Token::Var(v) = self.peek().clone() {
            self.advance();
            Ok(v)
        } else {
            Err(self.err(format!("expected a variable, got {:?}", self.peek())))
        }
    }

    // -- Script and blocks ---------------------------------------

    fn parse_script(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while self.peek() != &Token::Eof {
            if self.peek() == &Token::RBrace {
                let e = self.err("unexpected '}'");
                self.errors.push(e);
                self.advance();
                continue;
            }
            match self.parse_stmt() {
                Ok(s) => stmts.push(s),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_to_next_stmt();
                }
            }
        }
        stmts
    }

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let pos = self.cur_pos();
        self.expect(Token::LBrace, "{")?;
        let mut stmts = Vec::new();
        while self.peek() != &Token::RBrace {
            if self.peek() == &Token::Eof {
                return Err(self.err("expected '}', got end of file"));
            }
            match self.parse_stmt() {
                Ok(s) => stmts.push(s),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_to_next_stmt();
                }
            }
        }
        self.advance();
        Ok(Block { stmts, pos })
    }

    /// Skip tokens up to and including the next `;` at the current nesting
    /// level, or past a nested `{...}` that closes the broken statement.
    /// A `}` closing the enclosing block is left in place.
    fn recover_to_next_stmt(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Semi if depth == 0 => {
                    self.advance();
                    break;
                }
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Parse a token stream with recovery at statement boundaries.
///
/// Returns every statement that parsed, including those nested in blocks
/// whose siblings failed, plus the accumulated syntax errors.
pub fn parse(tokens: &[Spanned], filename: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
    let mut p = Parser::new(tokens, filename);
    let stmts = p.parse_script();
    (stmts, p.errors)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::lexer;

    fn parse_src(src: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
        let tokens = lexer::lex(src, "test.btrp").expect("lex should succeed");
        parse(&tokens, "test.btrp")
    }

    fn parse_ok(src: &str) -> Vec<Stmt> {
        let (stmts, errors) = parse_src(src);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        stmts
    }

    #[test]
    fn header_statements() {
        let stmts = parse_ok("namespace foo.bar;\nimport datacenter;\nimport apps.*;");
        assert_eq!(
            stmts[0],
            Stmt::Namespace {
                name: "foo.bar".into(),
                pos: Pos::new(1, 1)
            }
        );
        assert!(matches!(&stmts[1], Stmt::Import { id, .. } if id == "datacenter"));
        assert!(matches!(&stmts[2], Stmt::Import { id, .. } if id == "apps.*"));
    }

    #[test]
    fn template_assignment_with_enumeration_and_options() {
        let stmts = parse_ok("VM[1..5]web : tiny<clone, boot=7>;");
        match &stmts[0] {
            Stmt::TemplateAssign {
                target: Expr::Enum(e),
                template,
                options,
                ..
            } => {
                assert_eq!(e.kind, EnumKind::Vm);
                assert_eq!(e.head, "VM");
                assert_eq!(e.tail, "web");
                assert!(matches!(&e.items[0], RangeItem::Interval { .. }));
                assert_eq!(template, "tiny");
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].key, "clone");
                assert!(options[0].value.is_none());
                assert!(matches!(&options[1].value, Some(Expr::Number { raw, .. }) if raw == "7"));
            }
            other => panic!("expected a template assignment, got {:?}", other),
        }
    }

    #[test]
    fn enumeration_tails() {
        let tail_of = |stmt: &Stmt| match stmt {
            Stmt::TemplateAssign {
                target: Expr::Enum(e),
                ..
            }
            | Stmt::Assign {
                value: Expr::Enum(e),
                ..
            } => (e.head.clone(), e.tail.clone()),
            other => panic!("expected an enumeration, got {:?}", other),
        };
        let stmts = parse_ok(
            "@N[1..2].lan : defaultNode;\n\
             @node-[1..2]-eth0 : defaultNode;\n\
             $n = @N[1..2].lan;\n\
             VM[1..2]x.web : tiny;",
        );
        assert_eq!(tail_of(&stmts[0]), ("@N".into(), ".lan".into()));
        assert_eq!(tail_of(&stmts[1]), ("@node-".into(), "-eth0".into()));
        assert_eq!(tail_of(&stmts[2]), ("@N".into(), ".lan".into()));
        assert_eq!(tail_of(&stmts[3]), ("VM".into(), "x.web".into()));

        // A dash after a VM enumeration is still a subtraction.
        let stmts = parse_ok("$s = VM[1..3]-VM2;");
        assert!(matches!(
            &stmts[0],
            Stmt::Assign {
                value: Expr::Binary {
                    op: BinaryOp::Sub,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn set_literal_target_is_not_a_block() {
        let stmts = parse_ok("{VM1, VM2} : small;\n{ $x = 1; }");
        assert!(matches!(
            &stmts[0],
            Stmt::TemplateAssign {
                target: Expr::SetLiteral { .. },
                ..
            }
        ));
        assert!(matches!(&stmts[1], Stmt::Block(b) if b.stmts.len() == 1));
    }

    #[test]
    fn constraints_and_continuous_prefix() {
        let stmts = parse_ok("ban($T, @N[1..3]);\n>>spread(VM1);");
        assert!(
            matches!(&stmts[0], Stmt::Constraint { keyword, args, continuous: false, .. }
                if keyword == "ban" && args.len() == 2)
        );
        assert!(matches!(
            &stmts[1],
            Stmt::Constraint {
                continuous: true,
                ..
            }
        ));
    }

    #[test]
    fn export_with_scopes() {
        let stmts = parse_ok("export $a, $b to foo, bar.*, *;\nexport $me;");
        match &stmts[0] {
            Stmt::Export {
                targets, scopes, ..
            } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(
                    scopes.as_deref(),
                    Some(&["foo".to_string(), "bar.*".to_string(), "*".to_string()][..])
                );
            }
            other => panic!("expected an export, got {:?}", other),
        }
        assert!(matches!(&stmts[1], Stmt::Export { scopes: None, .. }));
    }

    #[test]
    fn precedence_of_operators() {
        let stmts = parse_ok("$x = 1 + 2 * 3 == 7 && !0;");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        let Expr::Binary { op, lhs, .. } = value else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinaryOp::And);
        let Expr::Binary { op, lhs, .. } = lhs.as_ref() else {
            panic!("expected an equality");
        };
        assert_eq!(*op, BinaryOp::Eq);
        assert!(matches!(lhs.as_ref(), Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn control_flow() {
        let stmts = parse_ok(
            "for $v in $T % 2 { spread($v); }\nif #$T > 3 { $x = 1; } else if $y { } else { $x = 2; }",
        );
        assert!(matches!(&stmts[0], Stmt::For { var, body, .. } if var == "$v" && body.stmts.len() == 1));
        match &stmts[1] {
            Stmt::If {
                otherwise: Some(b), ..
            } => assert!(matches!(&b.stmts[0], Stmt::If { .. })),
            other => panic!("expected an if/else, got {:?}", other),
        }
    }

    #[test]
    fn self_assignments() {
        let stmts = parse_ok("$x -= 2; $y %= $z;");
        assert!(matches!(&stmts[0], Stmt::Assign { op: AssignOp::Sub, .. }));
        assert!(matches!(&stmts[1], Stmt::Assign { op: AssignOp::Rem, .. }));
    }

    #[test]
    fn recovery_reports_each_broken_statement() {
        let (stmts, errors) = parse_src("$x = ;\nban($T;\n$y = 2;\nfor $i in $T { $z = ; $w = 1; }");
        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[1].line, 2);
        assert_eq!(errors[2].line, 4);
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[1], Stmt::For { body, .. } if body.stmts.len() == 1));
    }

    #[test]
    fn stray_closing_brace() {
        let (stmts, errors) = parse_src("}\n$x = 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.len(), 1);
    }
}
