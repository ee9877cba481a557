//! Relational dialect formatter.
//!
//! Renders a [`QueryCommand`] as
//! `SELECT <cols> FROM <source> [WHERE <predicate>] [ORDER BY <cols>]
//! [OFFSET <skip> ROWS [FETCH NEXT <top> ROWS ONLY]]`.
//!
//! String literals are emitted without escaping; validating or
//! parameterizing member names and literals sourced from untrusted input is
//! the calling layer's responsibility.

use crate::command::QueryCommand;
use crate::descriptor::{SelectDescriptor, SortDescriptor, SortDirection};
use crate::error::{QueryError, QueryResult};
use crate::filter::ast::{
    FilterCondition, FilterNode, FilterOperator, FilterValue, LogicalConnector,
};

const DIALECT: &str = "sql";
const DATETIME_SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqlFormatter {
    buffer: String,
}

impl SqlFormatter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Render the full paged query.
    pub fn format(command: &QueryCommand) -> QueryResult<String> {
        let mut formatter = SqlFormatter::new();
        formatter.select(&command.selects);
        formatter.from(&command.source);
        formatter.filter(command.filter.as_ref())?;
        formatter.order(&command.sorts);
        formatter.paged(command.skip, command.top);
        Ok(formatter.buffer)
    }

    /// Render a `Count(*)` query over the same predicate, without ordering
    /// or paging.
    pub fn format_count(command: &QueryCommand) -> QueryResult<String> {
        let mut formatter = SqlFormatter::new();
        formatter.write("SELECT Count(*)");
        formatter.from(&command.source);
        formatter.filter(command.filter.as_ref())?;
        Ok(formatter.buffer)
    }

    /// Render select/from/where only.
    pub fn format_unpaged(command: &QueryCommand) -> QueryResult<String> {
        let mut formatter = SqlFormatter::new();
        formatter.select(&command.selects);
        formatter.from(&command.source);
        formatter.filter(command.filter.as_ref())?;
        Ok(formatter.buffer)
    }

    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn select(&mut self, selects: &[SelectDescriptor]) {
        self.write("SELECT ");
        if selects.is_empty() {
            self.write("*");
        } else {
            let columns: Vec<&str> = selects.iter().map(|s| s.member.as_str()).collect();
            self.write(&columns.join(","));
        }
    }

    fn from(&mut self, source: &str) {
        self.write(" FROM ");
        self.write(source);
    }

    fn filter(&mut self, filter: Option<&FilterNode>) -> QueryResult<()> {
        if let Some(node) = filter {
            // Render the whole predicate before touching the buffer so an
            // unsupported operator never leaves a partial WHERE clause.
            let predicate = render_node(node)?;
            self.write(" WHERE ");
            self.write(&predicate);
        }
        Ok(())
    }

    fn order(&mut self, sorts: &[SortDescriptor]) {
        if sorts.is_empty() {
            return;
        }
        self.write(" ORDER BY ");
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

    fn paged(&mut self, skip: i32, top: i32) {
        if skip < 0 {
            return;
        }
        self.write(&format!(" OFFSET {} ROWS", skip));
        // A negative top with an explicit skip means "all remaining rows":
        // the cap clause is suppressed entirely.
        if top >= 0 {
            self.write(&format!(" FETCH NEXT {} ROWS ONLY", top));
        }
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
                LogicalConnector::And => "and",
                LogicalConnector::Or => "or",
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
            "{} {} {}",
            condition.member,
            comparison_symbol(condition.operator),
            render_value(&condition.value)?
        )),

        FilterOperator::StartsWith => Ok(format!(
            "{} LIKE '{}%'",
            condition.member,
            condition.value.raw_text()
        )),
        FilterOperator::EndsWith => Ok(format!(
            "{} LIKE '%{}'",
            condition.member,
            condition.value.raw_text()
        )),
        FilterOperator::Contains => Ok(format!(
            "{} LIKE '%{}%'",
            condition.member,
            condition.value.raw_text()
        )),

        FilterOperator::In => {
            let rendered = match &condition.value {
                FilterValue::List(items) => items
                    .iter()
                    .map(render_value)
                    .collect::<QueryResult<Vec<_>>>()?
                    .join(","),
                single => render_value(single)?,
            };
            Ok(format!("{} IN ({})", condition.member, rendered))
        }

        FilterOperator::Between => Err(QueryError::UnsupportedOperator {
            operator: condition.operator.opcode().to_string(),
            dialect: DIALECT.to_string(),
        }),
    }
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
        FilterValue::Bool(true) => Ok("1".to_string()),
        FilterValue::Bool(false) => Ok("0".to_string()),
        FilterValue::Int(n) => Ok(n.to_string()),
        FilterValue::Float(f) => {
            let mut text = f.to_string();
            // Force float literal typing when the decimal point got lost.
            if !text.contains('.') && !text.contains('e') {
                text.push_str(".0");
            }
            Ok(text)
        }
        FilterValue::String(s) => Ok(format!("'{}'", s)),
        FilterValue::DateTime(dt) => Ok(format!("N'{}'", dt.format(DATETIME_SQL_FORMAT))),
        FilterValue::Enum(_, ordinal) => Ok(ordinal.to_string()),
        FilterValue::List(_) => Err(QueryError::TypeError(
            "collection literal is only valid with the 'in' operator".to_string(),
        )),
    }
}
