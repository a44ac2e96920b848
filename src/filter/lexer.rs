//! Tokenizer for filter expressions.

use std::sync::OnceLock;

use regex::Regex;

use super::FilterSyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Number(f64),
    Str(String),
    LBracket,
    RBracket,
    Comma,
    /// Newline or `;`: starts another statement.
    Separator,
    Comparator(Comparator),
    And,
    Or,
    Not,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the expression.
    pub offset: usize,
    pub lexeme: String,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("Invalid regex pattern"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?").expect("Invalid regex pattern")
    })
}

/// True for names a filter can reference: `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_re()
        .find(name)
        .is_some_and(|m| m.end() == name.len())
}

pub fn tokenize(expression: &str) -> Result<Vec<Token>, FilterSyntaxError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < expression.len() {
        let rest = &expression[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if c == '\n' || c == ';' {
            tokens.push(token(TokenKind::Separator, pos, &rest[..1]));
            pos += 1;
            continue;
        }
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let (kind, len) = match c {
            '[' => (TokenKind::LBracket, 1),
            ']' => (TokenKind::RBracket, 1),
            ',' => (TokenKind::Comma, 1),
            '=' if rest.starts_with("==") => (TokenKind::Comparator(Comparator::Eq), 2),
            '!' if rest.starts_with("!=") => (TokenKind::Comparator(Comparator::Ne), 2),
            '<' if rest.starts_with("<=") => (TokenKind::Comparator(Comparator::Le), 2),
            '<' => (TokenKind::Comparator(Comparator::Lt), 1),
            '>' if rest.starts_with(">=") => (TokenKind::Comparator(Comparator::Ge), 2),
            '>' => (TokenKind::Comparator(Comparator::Gt), 1),
            '\'' | '"' => lex_string(expression, pos, c)?,
            _ => {
                if let Some(m) = number_re().find(rest) {
                    let value: f64 = m.as_str().parse().map_err(|_| {
                        FilterSyntaxError::new(expression, pos, format!("Invalid number '{}'", m.as_str()))
                    })?;
                    (TokenKind::Number(value), m.end())
                } else if let Some(m) = identifier_re().find(rest) {
                    let kind = match m.as_str() {
                        "and" => TokenKind::And,
                        "or" => TokenKind::Or,
                        "not" => TokenKind::Not,
                        "in" => TokenKind::In,
                        word => TokenKind::Identifier(word.to_string()),
                    };
                    (kind, m.end())
                } else {
                    return Err(FilterSyntaxError::new(
                        expression,
                        pos,
                        format!("Unexpected character '{}'", c),
                    ));
                }
            }
        };

        // `foo-bar`, `1abc`: a word glued to the previous token is not a valid shape.
        if let Some(next) = expression[pos + len..].chars().next() {
            let glued = matches!(kind, TokenKind::Number(_) | TokenKind::Identifier(_) | TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::In)
                && (next.is_alphanumeric() || next == '_' || next == '.');
            if glued {
                return Err(FilterSyntaxError::new(
                    expression,
                    pos,
                    format!("Invalid token '{}{}'", &rest[..len], next),
                ));
            }
        }

        tokens.push(token(kind, pos, &rest[..len]));
        pos += len;
    }

    Ok(tokens)
}

fn token(kind: TokenKind, offset: usize, lexeme: &str) -> Token {
    Token {
        kind,
        offset,
        lexeme: lexeme.to_string(),
    }
}

/// Returns the string token and its byte length including quotes.
fn lex_string(expression: &str, start: usize, quote: char) -> Result<(TokenKind, usize), FilterSyntaxError> {
    let mut value = String::new();
    let mut chars = expression[start + 1..].char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((TokenKind::Str(value), i + 2)),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            '\n' => break,
            c => value.push(c),
        }
    }

    Err(FilterSyntaxError::new(expression, start, "Unterminated string literal"))
}
