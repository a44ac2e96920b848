//! Filter expressions: a flat boolean combination of comparisons.
//!
//! Parsing and evaluation fail in two unrelated ways and the types keep them
//! apart. A [`FilterSyntaxError`] means the expression itself is broken and
//! the whole request fails. An [`EvaluationMiss`] means one item lacks an
//! attribute the expression reads; that item simply doesn't match.

mod cache;
mod eval;
mod lexer;
mod parser;

pub use cache::ExpressionCache;
pub use lexer::{is_valid_identifier, Comparator};
pub use parser::{BoolOp, Comparison, Expression, Operand};

use thiserror::Error;

use crate::model::Item;

/// Malformed filter expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid filter expression '{expression}' at offset {offset}: {message}")]
pub struct FilterSyntaxError {
    pub expression: String,
    /// Byte offset of the offending token.
    pub offset: usize,
    pub message: String,
}

impl FilterSyntaxError {
    pub(crate) fn new(expression: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            offset,
            message: message.into(),
        }
    }
}

/// The evaluated item has no value for an identifier the expression uses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("identifier '{identifier}' is not set")]
pub struct EvaluationMiss {
    pub identifier: String,
}

/// Items matching `expression`, preserving input order.
///
/// Items that miss an identifier are left out.
pub fn filter_items<'a, I>(items: I, expression: &Expression) -> Vec<&'a Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    items
        .into_iter()
        .filter(|item| match expression.matches(*item) {
            Ok(matched) => matched,
            Err(miss) => {
                log::debug!("Filter '{}' skips '{}': {}", expression.source(), item.tag, miss);
                false
            }
        })
        .collect()
}
