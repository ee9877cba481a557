//! Search-index dialect formatter.
//!
//! Renders a [`QueryCommand`] as a single-line
//! `from <source> where <predicate> order by <fields>` query for a
//! schemaless, full-text-capable index backend. Text operators become
//! boosted full-text search calls rather than substring matches, and `in`
//! becomes an OR-joined disjunction because the dialect has no native list
//! membership operator. Pagination is not part of this dialect; callers
//! page through the store's session API.

use crate::command::QueryCommand;
use crate::descriptor::{SortDescriptor, SortDirection};
use crate::error::{QueryError, QueryResult};
use crate::filter::ast::{
    FilterCondition, FilterNode, FilterOperator, FilterValue, LogicalConnector,
    DATETIME_WIRE_FORMAT,
};

const DIALECT: &str = "search";
const TEXT_BOOST: u32 = 10;

pub struct SearchFormatter {
    buffer: String,
}

impl SearchFormatter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Render the full single-line query.
    pub fn format(command: &QueryCommand) -> QueryResult<String> {
        let mut formatter = SearchFormatter::new();
        formatter.write("from ");
        formatter.write(&command.source);

        if let Some(node) = &command.filter {
            let predicate = render_node(node)?;
            formatter.write(" where ");
            formatter.write(&predicate);
        }

        formatter.order(&command.sorts);
        Ok(formatter.buffer)
    }

    /// Render just the predicate, for callers embedding it in a raw index
    /// query of their own.
    pub fn format_filter(command: &QueryCommand) -> QueryResult<String> {
        match &command.filter {
            Some(node) => render_node(node),
            None => Ok(String::new()),
        }
    }

    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn order(&mut self, sorts: &[SortDescriptor]) {
        if sorts.is_empty() {
            return;
        }
        self.write(" order by ");
        let rendered: Vec<String> = sorts
            .iter()
            .map(|sort| {
                let direction = match sort.direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                format!("{} {}", sort.member, direction)
            })
            .collect();
        self.write(&rendered.join(","));
    }
}

fn render_node(node: &FilterNode) -> QueryResult<String> {
    match node {
        FilterNode::Composite {
            left,
            right,
            connector,
            parenthesized,
        } => {
            let connector = match connector {
                LogicalConnector::And => "AND",
                LogicalConnector::Or => "OR",
            };
            let left = render_node(left)?;
            let right = render_node(right)?;
            if *parenthesized {
                Ok(format!("({} {} {})", left, connector, right))
            } else {
                Ok(format!("{} {} {}", left, connector, right))
            }
        }
        FilterNode::Condition(condition) => render_condition(condition),
    }
}

fn render_condition(condition: &FilterCondition) -> QueryResult<String> {
    match condition.operator {
        FilterOperator::Eq
        | FilterOperator::NotEq
        | FilterOperator::Lt
        | FilterOperator::Lte
        | FilterOperator::Gt
        | FilterOperator::Gte => Ok(format!(
            "{}{}{}",
            condition.member,
            comparison_symbol(condition.operator),
            render_value(&condition.value)?
        )),

        FilterOperator::StartsWith => Ok(text_search(
            &condition.member,
            &format!("{}*", condition.value.raw_text()),
        )),
        FilterOperator::EndsWith => Ok(text_search(
            &condition.member,
            &format!("*{}", condition.value.raw_text()),
        )),
        FilterOperator::Contains => Ok(text_search(
            &condition.member,
            &format!("*{}*", condition.value.raw_text()),
        )),

        FilterOperator::In => {
            let candidates = match &condition.value {
                FilterValue::List(items) => items.iter().collect::<Vec<_>>(),
                single => vec![single],
            };
            let terms = candidates
                .into_iter()
                .map(|candidate| {
                    Ok(format!("{}={}", condition.member, render_value(candidate)?))
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(format!("({})", terms.join(" OR ")))
        }

        FilterOperator::Between => Err(QueryError::UnsupportedOperator {
            operator: condition.operator.opcode().to_string(),
            dialect: DIALECT.to_string(),
        }),
    }
}

fn text_search(member: &str, pattern: &str) -> String {
    format!("boost(search({},'{}'),{})", member, pattern, TEXT_BOOST)
}

fn comparison_symbol(operator: FilterOperator) -> &'static str {
    match operator {
        FilterOperator::Eq => "=",
        FilterOperator::NotEq => "!=",
        FilterOperator::Lt => "<",
        FilterOperator::Lte => "<=",
        FilterOperator::Gt => ">",
        FilterOperator::Gte => ">=",
        _ => "",
    }
}

fn render_value(value: &FilterValue) -> QueryResult<String> {
    match value {
        FilterValue::Null => Ok("NULL".to_string()),
        FilterValue::Bool(b) => Ok(b.to_string()),
        FilterValue::Int(n) => Ok(n.to_string()),
        FilterValue::Float(f) => Ok(f.to_string()),
        FilterValue::String(s) => Ok(format!("'{}'", s)),
        FilterValue::DateTime(dt) => Ok(dt.format(DATETIME_WIRE_FORMAT).to_string()),
        FilterValue::Enum(_, ordinal) => Ok(ordinal.to_string()),
        FilterValue::List(_) => Err(QueryError::TypeError(
            "collection literal is only valid with the 'in' operator".to_string(),
        )),
    }
}
