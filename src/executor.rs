//! In-memory evaluator.
//!
//! Executes a [`QueryCommand`] directly against a sequence of values:
//! filter, count, multi-key stable sort, then skip/top. Each item is
//! serialized once to a JSON document, so serde's derived serialization is
//! the per-type member lookup table; there is no reflection cache and no
//! shared state. This evaluator is the reference semantics for the two
//! textual dialects — its text operators use SQL LIKE pattern matching so
//! results agree with what the rendered `LIKE` clauses would select.

use std::cmp::Ordering;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::command::QueryCommand;
use crate::descriptor::{SortDescriptor, SortDirection};
use crate::error::{QueryError, QueryResult};
use crate::filter::ast::{FilterCondition, FilterNode, FilterOperator, FilterValue, LogicalConnector};

/// One page of evaluation output: the post-filter, pre-pagination total and
/// the page items in their final order.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedPage<T> {
    pub total: usize,
    pub items: Vec<T>,
}

/// Evaluate a command against a sequence of values.
///
/// `skip`/`top` honor the -1 sentinel: a negative skip starts from the
/// first row and a negative top applies no limit.
pub fn evaluate<T: Serialize>(
    items: impl IntoIterator<Item = T>,
    command: &QueryCommand,
) -> QueryResult<EvaluatedPage<T>> {
    let mut rows = Vec::new();
    let mut scanned = 0usize;

    for item in items {
        scanned += 1;
        let doc = serde_json::to_value(&item)?;
        let keep = match &command.filter {
            Some(node) => eval_node(node, &doc)?,
            None => true,
        };
        if keep {
            rows.push((doc, item));
        }
    }

    let total = rows.len();
    tracing::debug!(
        "evaluated '{}': kept {} of {} rows",
        command.source,
        total,
        scanned
    );

    if !command.sorts.is_empty() {
        rows = sort_rows(rows, &command.sorts)?;
    }

    let mut page: Vec<T> = rows.into_iter().map(|(_, item)| item).collect();
    if command.skip >= 0 {
        let skip = command.skip as usize;
        page = if skip >= page.len() {
            Vec::new()
        } else {
            page.split_off(skip)
        };
    }
    if command.top >= 0 {
        page.truncate(command.top as usize);
    }

    Ok(EvaluatedPage { total, items: page })
}

/// Resolve a dotted member path against a document.
///
/// Unlike a permissive document query, a missing segment is an error rather
/// than Null: a silently ignored member would mask a caller typo in an
/// access-control-adjacent filter.
fn member_value(doc: &Value, path: &str) -> QueryResult<Value> {
    let mut current = doc;

    for segment in path.split('.') {
        match current.get(segment) {
            Some(value) => current = value,
            None => return Err(QueryError::UnknownMember(path.to_string())),
        }
    }

    Ok(current.clone())
}

fn eval_node(node: &FilterNode, doc: &Value) -> QueryResult<bool> {
    match node {
        FilterNode::Composite {
            left,
            right,
            connector,
            ..
        } => {
            // Both sides evaluate unconditionally so unknown-member errors
            // surface regardless of connector order.
            let left = eval_node(left, doc)?;
            let right = eval_node(right, doc)?;
            Ok(match connector {
                LogicalConnector::And => left && right,
                LogicalConnector::Or => left || right,
            })
        }
        FilterNode::Condition(condition) => eval_condition(condition, doc),
    }
}

fn eval_condition(condition: &FilterCondition, doc: &Value) -> QueryResult<bool> {
    let actual = member_value(doc, &condition.member)?;
    let expected = condition.value.to_json();

    match condition.operator {
        FilterOperator::Eq => Ok(values_equal(&actual, &expected)),
        FilterOperator::NotEq => Ok(!values_equal(&actual, &expected)),
        FilterOperator::Lt => Ok(compare_values(&actual, &expected) == Ordering::Less),
        FilterOperator::Lte => Ok(compare_values(&actual, &expected) != Ordering::Greater),
        FilterOperator::Gt => Ok(compare_values(&actual, &expected) == Ordering::Greater),
        FilterOperator::Gte => Ok(compare_values(&actual, &expected) != Ordering::Less),

        FilterOperator::StartsWith => {
            like_match(&actual, &format!("{}%", condition.value.raw_text()))
        }
        FilterOperator::EndsWith => {
            like_match(&actual, &format!("%{}", condition.value.raw_text()))
        }
        FilterOperator::Contains => {
            like_match(&actual, &format!("%{}%", condition.value.raw_text()))
        }

        FilterOperator::In => match &expected {
            Value::Array(candidates) => {
                Ok(candidates.iter().any(|candidate| values_equal(&actual, candidate)))
            }
            single => Ok(values_equal(&actual, single)),
        },

        FilterOperator::Between => match &condition.value {
            FilterValue::List(items) if items.len() >= 2 => {
                let low = items[0].to_json();
                let high = items[items.len() - 1].to_json();
                Ok(compare_values(&actual, &low) != Ordering::Less
                    && compare_values(&actual, &high) != Ordering::Greater)
            }
            _ => Err(QueryError::TypeError(
                "bt requires a {low,high} range literal".to_string(),
            )),
        },
    }
}

/// Multi-key stable sort. Keys are resolved up front so an unknown sort
/// member surfaces before any reordering happens.
fn sort_rows<T>(
    rows: Vec<(Value, T)>,
    sorts: &[SortDescriptor],
) -> QueryResult<Vec<(Value, T)>> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let mut keys = Vec::with_capacity(sorts.len());
        for sort in sorts {
            keys.push(member_value(&row.0, &sort.member)?);
        }
        keyed.push((keys, row));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        for (index, sort) in sorts.iter().enumerate() {
            let ordering = match sort.direction {
                SortDirection::Ascending => compare_values(&a[index], &b[index]),
                SortDirection::Descending => compare_values(&b[index], &a[index]),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Compare two JSON values for equality. Numbers compare by their f64
/// representation so `1` and `1.0` are equal.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Compare two JSON values for ordering. Null sorts lowest; mixed types
/// compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// SQL LIKE semantics: `%` matches any run, `_` a single character,
/// everything else is literal.
fn like_match(value: &Value, pattern: &str) -> QueryResult<bool> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => return Ok(false),
        other => other.to_string(),
    };

    let mut regex_pattern = String::with_capacity(pattern.len() + 2);
    regex_pattern.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
            | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern.push('$');

    match Regex::new(&regex_pattern) {
        Ok(re) => Ok(re.is_match(&text)),
        Err(_) => Ok(false),
    }
}
