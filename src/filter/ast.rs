use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire format for datetime values crossing into JSON documents and the
/// search dialect.
pub const DATETIME_WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Comparison operators accepted by filter conditions.
///
/// `In` takes a collection operand and `Between` a two-element range; every
/// other operator takes a single comparand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    StartsWith,
    EndsWith,
    Contains,
    In,
    Between,
}

impl FilterOperator {
    /// Grammar opcode for this operator.
    pub fn opcode(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::NotEq => "neq",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::StartsWith => "sw",
            FilterOperator::EndsWith => "ew",
            FilterOperator::Contains => "ct",
            FilterOperator::In => "in",
            FilterOperator::Between => "bt",
        }
    }

    /// Look up an operator by its grammar opcode.
    pub fn from_opcode(opcode: &str) -> Option<FilterOperator> {
        match opcode {
            "eq" => Some(FilterOperator::Eq),
            "neq" => Some(FilterOperator::NotEq),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "sw" => Some(FilterOperator::StartsWith),
            "ew" => Some(FilterOperator::EndsWith),
            "ct" => Some(FilterOperator::Contains),
            "in" => Some(FilterOperator::In),
            "bt" => Some(FilterOperator::Between),
            _ => None,
        }
    }
}

/// Logical connector joining two filter nodes. Precedence is expressed by
/// the tree structure, never by the connector itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalConnector {
    And,
    Or,
}

/// Typed literal carried by a filter condition.
///
/// Carries enough type information for every renderer to pick the correct
/// quoting without re-inspecting the source text. `Enum` is never produced
/// by the grammar; it exists for programmatically built commands and renders
/// as its underlying ordinal. `List` holds the operand of `In`/`Between`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
    Enum(String, i64),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert the literal to a JSON value for in-memory evaluation.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Null => Value::Null,
            FilterValue::Bool(b) => Value::Bool(*b),
            FilterValue::Int(n) => Value::Number((*n).into()),
            FilterValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FilterValue::String(s) => Value::String(s.clone()),
            FilterValue::DateTime(dt) => {
                Value::String(dt.format(DATETIME_WIRE_FORMAT).to_string())
            }
            FilterValue::Enum(_, ordinal) => Value::Number((*ordinal).into()),
            FilterValue::List(items) => {
                Value::Array(items.iter().map(FilterValue::to_json).collect())
            }
        }
    }

    /// The literal's bare text, as substituted into LIKE and search patterns.
    pub fn raw_text(&self) -> String {
        match self {
            FilterValue::Null => String::new(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::String(s) => s.clone(),
            FilterValue::DateTime(dt) => dt.format(DATETIME_WIRE_FORMAT).to_string(),
            FilterValue::Enum(_, ordinal) => ordinal.to_string(),
            FilterValue::List(items) => items
                .iter()
                .map(FilterValue::raw_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// A single member comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Dotted property path (e.g. `Address.City`).
    pub member: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Filter AST node: a leaf comparison or a binary logical composition.
///
/// A composite always has exactly two children. `parenthesized` marks
/// grouping that was explicit in the source and must be reproduced by
/// renderers; unparenthesized sequences rely on the left-leaning structure
/// alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterNode {
    Condition(FilterCondition),
    Composite {
        left: Box<FilterNode>,
        right: Box<FilterNode>,
        connector: LogicalConnector,
        parenthesized: bool,
    },
}

impl FilterNode {
    /// Build a leaf comparison node.
    pub fn condition(
        member: impl Into<String>,
        operator: FilterOperator,
        value: FilterValue,
    ) -> FilterNode {
        FilterNode::Condition(FilterCondition {
            member: member.into(),
            operator,
            value,
        })
    }

    /// Compose `self AND right`, with `self` as the left child.
    pub fn and(self, right: FilterNode) -> FilterNode {
        FilterNode::Composite {
            left: Box::new(self),
            right: Box::new(right),
            connector: LogicalConnector::And,
            parenthesized: false,
        }
    }

    /// Compose `self OR right`, with `self` as the left child.
    pub fn or(self, right: FilterNode) -> FilterNode {
        FilterNode::Composite {
            left: Box::new(self),
            right: Box::new(right),
            connector: LogicalConnector::Or,
            parenthesized: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_opcode_round_trip() {
        for op in [
            FilterOperator::Eq,
            FilterOperator::NotEq,
            FilterOperator::Lt,
            FilterOperator::Lte,
            FilterOperator::Gt,
            FilterOperator::Gte,
            FilterOperator::StartsWith,
            FilterOperator::EndsWith,
            FilterOperator::Contains,
            FilterOperator::In,
            FilterOperator::Between,
        ] {
            assert_eq!(FilterOperator::from_opcode(op.opcode()), Some(op));
        }
        assert_eq!(FilterOperator::from_opcode("bogus"), None);
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(FilterValue::Null.to_json(), Value::Null);
        assert_eq!(FilterValue::Bool(true).to_json(), json!(true));
        assert_eq!(FilterValue::Int(42).to_json(), json!(42));
        assert_eq!(FilterValue::String("x".to_string()).to_json(), json!("x"));
        assert_eq!(
            FilterValue::Enum("Status".to_string(), 3).to_json(),
            json!(3)
        );
        assert_eq!(
            FilterValue::List(vec![FilterValue::Int(1), FilterValue::Int(2)]).to_json(),
            json!([1, 2])
        );
    }

    #[test]
    fn test_composition_helpers() {
        let node = FilterNode::condition("A", FilterOperator::Eq, FilterValue::Int(1))
            .and(FilterNode::condition("B", FilterOperator::Eq, FilterValue::Int(2)));
        match node {
            FilterNode::Composite {
                connector,
                parenthesized,
                ..
            } => {
                assert_eq!(connector, LogicalConnector::And);
                assert!(!parenthesized);
            }
            _ => panic!("expected composite"),
        }
    }
}
