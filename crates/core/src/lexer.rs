use crate::error::Diagnostic;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords, distinguished in the parser. May contain
    /// inner dots (`foo.bar`).
    Word(String),
    /// `$label`, the sigil included
    Var(String),
    /// `@name`, the sigil included
    Node(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Numeric literal, kept raw: radix and validity are checked on evaluation
    Number(String),
    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semi,
    Comma,
    Dot,
    DotDot,
    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    // Arithmetic and set operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Hash,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Logical operators
    And,
    Or,
    Not,
    /// `>>` prefix of a continuous constraint
    Continuous,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
    /// Char offsets, used to detect glued fragments such as `VM[`.
    pub start: usize,
    pub end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Scan a word starting at `pos`; inner dots are kept when followed by a
/// word character. Node names additionally accept `-`.
fn scan_word(chars: &[char], mut pos: usize, allow_dash: bool) -> usize {
    while pos < chars.len() {
        let c = chars[pos];
        if is_word_char(c) || (allow_dash && c == '-') {
            pos += 1;
        } else if c == '.' && pos + 1 < chars.len() && is_word_char(chars[pos + 1]) {
            pos += 1;
        } else {
            break;
        }
    }
    pos
}

pub fn lex(src: &str, filename: &str) -> Result<Vec<Spanned>, Diagnostic> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut line_start = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        // Line comment
        if c == '/' && pos + 1 < chars.len() && chars[pos + 1] == '/' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && pos + 1 < chars.len() && chars[pos + 1] == '*' {
            let (open_line, open_col) = (line, (pos - line_start) as u32 + 1);
            pos += 2;
            loop {
                if pos >= chars.len() {
                    return Err(Diagnostic::new(
                        filename,
                        open_line,
                        open_col,
                        "unterminated block comment",
                    ));
                }
                if chars[pos] == '\n' {
                    line += 1;
                    line_start = pos + 1;
                }
                if chars[pos] == '*' && pos + 1 < chars.len() && chars[pos + 1] == '/' {
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
                line_start = pos + 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;
        let tok_col = (pos - line_start) as u32 + 1;
        let start = pos;
        let push = |tokens: &mut Vec<Spanned>, token: Token, end: usize| {
            tokens.push(Spanned {
                token,
                line: tok_line,
                column: tok_col,
                start,
                end,
            });
        };

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() || chars[pos] == '\n' {
                    return Err(Diagnostic::new(
                        filename,
                        tok_line,
                        tok_col,
                        "unterminated string literal",
                    ));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(Diagnostic::new(
                            filename,
                            tok_line,
                            tok_col,
                            "unterminated escape in string",
                        ));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            push(&mut tokens, Token::Str(s), pos);
            continue;
        }

        // Number: decimal, octal (leading 0), hexadecimal (0x) or real
        if c.is_ascii_digit() {
            if c == '0' && pos + 1 < chars.len() && matches!(chars[pos + 1], 'x' | 'X') {
                pos += 2;
                while pos < chars.len() && chars[pos].is_ascii_hexdigit() {
                    pos += 1;
                }
            } else {
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                    pos += 1;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            let raw: String = chars[start..pos].iter().collect();
            push(&mut tokens, Token::Number(raw), pos);
            continue;
        }

        // $variable
        if c == '$' {
            let end = scan_word(&chars, pos + 1, false);
            if end == pos + 1 {
                return Err(Diagnostic::new(
                    filename,
                    tok_line,
                    tok_col,
                    "expected a variable name after '$'",
                ));
            }
            let label: String = chars[start..end].iter().collect();
            pos = end;
            push(&mut tokens, Token::Var(label), pos);
            continue;
        }

        // @node
        if c == '@' {
            let end = scan_word(&chars, pos + 1, true);
            if end == pos + 1 {
                return Err(Diagnostic::new(
                    filename,
                    tok_line,
                    tok_col,
                    "expected a node name after '@'",
                ));
            }
            let name: String = chars[start..end].iter().collect();
            pos = end;
            push(&mut tokens, Token::Node(name), pos);
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' {
            let end = scan_word(&chars, pos, false);
            let word: String = chars[start..end].iter().collect();
            pos = end;
            push(&mut tokens, Token::Word(word), pos);
            continue;
        }

        // Operators and punctuation, longest match first
        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('.', Some('.')) => (Token::DotDot, 2),
            ('.', _) => (Token::Dot, 1),
            ('+', Some('=')) => (Token::PlusAssign, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', Some('=')) => (Token::MinusAssign, 2),
            ('-', _) => (Token::Minus, 1),
            ('*', Some('=')) => (Token::StarAssign, 2),
            ('*', _) => (Token::Star, 1),
            ('/', Some('=')) => (Token::SlashAssign, 2),
            ('/', _) => (Token::Slash, 1),
            ('%', Some('=')) => (Token::PercentAssign, 2),
            ('%', _) => (Token::Percent, 1),
            ('=', Some('=')) => (Token::Eq, 2),
            ('=', _) => (Token::Assign, 1),
            ('!', Some('=')) => (Token::Neq, 2),
            ('!', _) => (Token::Not, 1),
            ('<', Some('=')) => (Token::Lte, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Gte, 2),
            ('>', Some('>')) => (Token::Continuous, 2),
            ('>', _) => (Token::Gt, 1),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('#', _) => (Token::Hash, 1),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (':', _) => (Token::Colon, 1),
            (';', _) => (Token::Semi, 1),
            (',', _) => (Token::Comma, 1),
            _ => {
                return Err(Diagnostic::new(
                    filename,
                    tok_line,
                    tok_col,
                    format!("unexpected character '{}'", c),
                ));
            }
        };
        pos += width;
        push(&mut tokens, token, pos);
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
        column: (pos - line_start) as u32 + 1,
        start: pos,
        end: pos,
    });
    Ok(tokens)
}
