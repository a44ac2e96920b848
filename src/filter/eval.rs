//! Evaluation of parsed filter expressions against one attribute source.

use std::cmp::Ordering;

use super::lexer::Comparator;
use super::parser::{BoolOp, Comparison, Expression, Operand};
use super::EvaluationMiss;
use crate::model::{AttributeSource, AttributeValue};

/// Runtime value of an operand.
#[derive(Debug, Clone, PartialEq)]
enum Value<'a> {
    Str(&'a str),
    Num(f64),
    List(Vec<Value<'a>>),
}

impl Expression {
    /// Whether `source` satisfies the expression.
    ///
    /// `and`/`or` are applied left to right and short-circuit, so an
    /// identifier in a term that is never reached cannot cause a miss.
    pub fn matches<S>(&self, source: &S) -> Result<bool, EvaluationMiss>
    where
        S: AttributeSource + ?Sized,
    {
        let mut result = self.first.evaluate(source)?;
        for (op, comparison) in &self.rest {
            result = match (op, result) {
                (BoolOp::And, false) => false,
                (BoolOp::Or, true) => true,
                _ => comparison.evaluate(source)?,
            };
        }
        Ok(result)
    }
}

impl Comparison {
    fn evaluate<S>(&self, source: &S) -> Result<bool, EvaluationMiss>
    where
        S: AttributeSource + ?Sized,
    {
        let left = bind(&self.left, source)?;
        let right = bind(&self.right, source)?;
        Ok(match self.comparator {
            Comparator::Eq => equals(&left, &right),
            Comparator::Ne => !equals(&left, &right),
            Comparator::Lt => compare(&left, &right) == Some(Ordering::Less),
            Comparator::Le => matches!(compare(&left, &right), Some(Ordering::Less | Ordering::Equal)),
            Comparator::Gt => compare(&left, &right) == Some(Ordering::Greater),
            Comparator::Ge => matches!(compare(&left, &right), Some(Ordering::Greater | Ordering::Equal)),
            Comparator::In => contains(&right, &left),
            Comparator::NotIn => !contains(&right, &left),
        })
    }
}

fn bind<'a, S>(operand: &'a Operand, source: &'a S) -> Result<Value<'a>, EvaluationMiss>
where
    S: AttributeSource + ?Sized,
{
    Ok(match operand {
        Operand::Identifier(name) => match source.attribute(name) {
            AttributeValue::Text(text) => Value::Str(text),
            AttributeValue::Absent => {
                return Err(EvaluationMiss {
                    identifier: name.clone(),
                })
            }
        },
        Operand::Number(n) => Value::Num(*n),
        Operand::Str(s) => Value::Str(s),
        Operand::List(items) => Value::List(
            items
                .iter()
                .map(|item| bind(item, source))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Attribute text compared with a number literal is read as a number.
fn as_number(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

fn equals(left: &Value<'_>, right: &Value<'_>) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Str(s), Value::Num(n)) | (Value::Num(n), Value::Str(s)) => as_number(s) == Some(*n),
        (Value::List(a), Value::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y)),
        _ => false,
    }
}

/// Natural ordering of same-typed operands; `None` when they don't compare.
fn compare(left: &Value<'_>, right: &Value<'_>) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
        (Value::Str(s), Value::Num(n)) => as_number(s)?.partial_cmp(n),
        (Value::Num(n), Value::Str(s)) => n.partial_cmp(&as_number(s)?),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

fn contains(container: &Value<'_>, needle: &Value<'_>) -> bool {
    match (container, needle) {
        (Value::List(items), _) => items.iter().any(|item| equals(item, needle)),
        (Value::Str(haystack), Value::Str(needle)) => haystack.contains(needle),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn values() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("color".to_string(), "red".to_string());
        map.insert("version".to_string(), "1.2".to_string());
        map
    }

    fn matches(expression: &str) -> bool {
        Expression::parse(expression)
            .unwrap()
            .matches(&values())
            .unwrap()
    }

    #[test]
    fn test_equality() {
        assert!(matches("color == 'red'"));
        assert!(!matches("color == 'blue'"));
        assert!(matches("'red' == color"));
        assert!(!matches("'blue' == color"));
        assert!(matches("'red' == 'red'"));
        assert!(!matches("'blue' == 'red'"));
        assert!(!matches("'blue' == 4.2"));
        assert!(!matches("color != 'red'"));
        assert!(matches("color != 'blue'"));
        assert!(matches("version == 1.2"));
    }

    #[test]
    fn test_ordering() {
        assert!(!matches("version > 2"));
        assert!(matches("version > 1.1"));
        assert!(!matches("version >= 2"));
        assert!(matches("version >= 1.2"));
        assert!(matches("version < 2"));
        assert!(!matches("version < 1.1"));
        assert!(matches("version <= 1.2"));
        assert!(!matches("version <= 1.1"));
        assert!(matches("color >= 'blue'"));
        assert!(matches("color < 'yellow'"));
    }

    #[test]
    fn test_incompatible_operands() {
        assert!(!matches("color > 1"));
        assert!(!matches("color <= 1"));
        assert!(matches("color != 1"));
    }

    #[test]
    fn test_membership() {
        assert!(!matches("version in []"));
        assert!(matches("version in [1.1, 1.2, -4]"));
        assert!(matches("version not in []"));
        assert!(!matches("version not in [1.1, 1.2, -4]"));
        assert!(matches("color in ['blue', 'red']"));
        assert!(matches("'ed' in color"));
        assert!(!matches("'blue' in color"));
        assert!(!matches("color in 4"));
    }

    #[test]
    fn test_boolean_combination() {
        assert!(matches("color == 'red' and version > 1.1"));
        assert!(!matches("color == 'red' and version > 2.0"));
        assert!(!matches("color == 'blue' and version > 1.1"));
        assert!(matches("color == 'red' or version > 2.0"));
        assert!(matches("color == 'blue' or version > 1.1"));
        assert!(!matches("color == 'blue' or version > 2.0"));
        // Left to right: (true or false) and false.
        assert!(!matches("color == 'red' or version > 2.0 and color == 'blue'"));
    }

    #[test]
    fn test_missing_identifier_is_a_miss() {
        let expr = Expression::parse("owner == 'me'").unwrap();
        let miss = expr.matches(&values()).unwrap_err();
        assert_eq!(miss.identifier, "owner");
    }

    #[test]
    fn test_short_circuit_skips_missing_identifier() {
        let expr = Expression::parse("color == 'red' or owner == 'me'").unwrap();
        assert_eq!(expr.matches(&values()), Ok(true));
        let expr = Expression::parse("color == 'blue' and owner == 'me'").unwrap();
        assert_eq!(expr.matches(&values()), Ok(false));
        let expr = Expression::parse("color == 'red' and owner == 'me'").unwrap();
        assert!(expr.matches(&values()).is_err());
    }
}
