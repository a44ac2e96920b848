//! Parser for the flat filter grammar.
//!
//! ```text
//! expr       := term (("and" | "or") term)*
//! term       := value comparator value
//! value      := identifier | number | string | "[" [value ("," value)*] "]"
//! comparator := "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not in"
//! ```

use super::lexer::{tokenize, Comparator, Token, TokenKind};
use super::FilterSyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Identifier(String),
    Number(f64),
    Str(String),
    List(Vec<Operand>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub comparator: Comparator,
    pub right: Operand,
}

/// A parsed filter: comparisons combined left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub(crate) source: String,
    pub(crate) first: Comparison,
    pub(crate) rest: Vec<(BoolOp, Comparison)>,
}

impl Expression {
    pub fn parse(expression: &str) -> Result<Self, FilterSyntaxError> {
        let tokens = tokenize(expression)?;
        let mut parser = TokenParser {
            expression,
            tokens: &tokens,
            pos: 0,
        };
        parser.parse_expression()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every identifier the expression reads, in order of appearance.
    pub fn identifiers(&self) -> Vec<&str> {
        fn walk<'a>(operand: &'a Operand, out: &mut Vec<&'a str>) {
            match operand {
                Operand::Identifier(name) => out.push(name),
                Operand::List(items) => items.iter().for_each(|item| walk(item, out)),
                Operand::Number(_) | Operand::Str(_) => {}
            }
        }
        let mut out = Vec::new();
        for comparison in std::iter::once(&self.first).chain(self.rest.iter().map(|(_, c)| c)) {
            walk(&comparison.left, &mut out);
            walk(&comparison.right, &mut out);
        }
        out
    }
}

impl std::str::FromStr for Expression {
    type Err = FilterSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct TokenParser<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenParser<'a> {
    fn parse_expression(&mut self) -> Result<Expression, FilterSyntaxError> {
        // Leading and trailing blank lines are not extra statements.
        let start = self.tokens.iter().position(|t| t.kind != TokenKind::Separator);
        let end = self.tokens.iter().rposition(|t| t.kind != TokenKind::Separator);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(self.error_at(0, "Filter invalid because it is empty"));
        };
        let tokens = self.tokens;
        self.tokens = &tokens[start..=end];

        let first = self.parse_comparison()?;
        let mut rest = Vec::new();

        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::And => BoolOp::And,
                TokenKind::Or => BoolOp::Or,
                TokenKind::Separator | TokenKind::Comma => {
                    return Err(self.error_at(token.offset, "Filter invalid because it has multiple expressions"));
                }
                _ => {
                    return Err(self.error_at(
                        token.offset,
                        format!("Unexpected '{}' after comparison; expected 'and' or 'or'", token.lexeme),
                    ));
                }
            };
            self.pos += 1;
            rest.push((op, self.parse_comparison()?));
        }

        Ok(Expression {
            source: self.expression.to_string(),
            first,
            rest,
        })
    }

    fn parse_comparison(&mut self) -> Result<Comparison, FilterSyntaxError> {
        let left = self.parse_value()?;
        let comparator = self.parse_comparator()?;
        let right = self.parse_value()?;

        if let Some(token) = self.peek() {
            if matches!(token.kind, TokenKind::Comparator(_) | TokenKind::In | TokenKind::Not) {
                return Err(self.error_at(token.offset, "Filter doesn't support multiple comparators"));
            }
        }

        Ok(Comparison {
            left,
            comparator,
            right,
        })
    }

    fn parse_comparator(&mut self) -> Result<Comparator, FilterSyntaxError> {
        let Some(token) = self.next() else {
            return Err(self.error_at(self.expression.len(), "Filter term must be a comparison"));
        };
        match &token.kind {
            TokenKind::Comparator(comparator) => Ok(*comparator),
            TokenKind::In => Ok(Comparator::In),
            TokenKind::Not => match self.next() {
                Some(Token { kind: TokenKind::In, .. }) => Ok(Comparator::NotIn),
                _ => Err(self.error_at(token.offset, "Expected 'in' after 'not'")),
            },
            TokenKind::Identifier(word) => {
                Err(self.error_at(token.offset, format!("Invalid operator '{}'", word)))
            }
            TokenKind::Separator | TokenKind::Comma => {
                Err(self.error_at(token.offset, "Filter invalid because it has multiple expressions"))
            }
            _ => Err(self.error_at(
                token.offset,
                format!("Unexpected '{}'; expected a comparison operator", token.lexeme),
            )),
        }
    }

    fn parse_value(&mut self) -> Result<Operand, FilterSyntaxError> {
        let Some(token) = self.next() else {
            return Err(self.error_at(self.expression.len(), "Unexpected end of filter expression"));
        };
        match &token.kind {
            TokenKind::Identifier(name) => Ok(Operand::Identifier(name.clone())),
            TokenKind::Number(value) => Ok(Operand::Number(*value)),
            TokenKind::Str(value) => Ok(Operand::Str(value.clone())),
            TokenKind::LBracket => self.parse_list(),
            _ => Err(self.error_at(
                token.offset,
                format!("Unexpected '{}'; expected a value", token.lexeme),
            )),
        }
    }

    fn parse_list(&mut self) -> Result<Operand, FilterSyntaxError> {
        let mut items = Vec::new();
        if matches!(self.peek(), Some(Token { kind: TokenKind::RBracket, .. })) {
            self.pos += 1;
            return Ok(Operand::List(items));
        }
        loop {
            items.push(self.parse_value()?);
            match self.next() {
                Some(Token { kind: TokenKind::Comma, .. }) => continue,
                Some(Token { kind: TokenKind::RBracket, .. }) => return Ok(Operand::List(items)),
                Some(token) => {
                    return Err(self.error_at(
                        token.offset,
                        format!("Unexpected '{}' in list", token.lexeme),
                    ))
                }
                None => return Err(self.error_at(self.expression.len(), "Unterminated list")),
            }
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> FilterSyntaxError {
        FilterSyntaxError::new(self.expression, offset, message)
    }
}
