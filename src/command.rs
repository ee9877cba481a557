//! The backend-neutral query command and its builders.
//!
//! A [`QueryCommand`] is assembled once per request from a raw query string
//! (or from its already-split pieces), then handed read-only to one of the
//! dialect formatters or the in-memory evaluator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{deserialize_descriptors, SelectDescriptor, SortDescriptor};
use crate::error::{QueryError, QueryResult};
use crate::filter::ast::{FilterNode, FilterOperator, FilterValue};
use crate::filter::parser;

// Reserved query-string parameter names. Every `$`-prefixed key is stripped
// from the residual parameter bag, known or not.
const PARAM_TOP: &str = "$top";
const PARAM_SKIP: &str = "$skip";
const PARAM_FILTER: &str = "$filter";
const PARAM_SELECT: &str = "$select";
const PARAM_ORDERBY: &str = "$orderby";
const PARAM_FROM: &str = "$from";

/// Member name carrying the soft-delete flag.
const SOFT_DELETE_MEMBER: &str = "Deleted";

/// Sentinel marking "unspecified" for skip/top. 0 is a valid explicit value,
/// so absence is encoded as -1.
pub const UNSPECIFIED: i32 = -1;

/// Immutable, backend-neutral representation of a parsed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCommand {
    /// Table, collection or index the query runs against.
    pub source: String,
    pub filter: Option<FilterNode>,
    pub sorts: Vec<SortDescriptor>,
    /// Projection list; empty means all members.
    pub selects: Vec<SelectDescriptor>,
    pub skip: i32,
    pub top: i32,
    /// Residual non-`$` query parameters, passed through verbatim for
    /// renderer-specific use.
    pub parameters: HashMap<String, String>,
}

impl Default for QueryCommand {
    fn default() -> Self {
        Self {
            source: String::new(),
            filter: None,
            sorts: Vec::new(),
            selects: Vec::new(),
            skip: UNSPECIFIED,
            top: UNSPECIFIED,
            parameters: HashMap::new(),
        }
    }
}

impl QueryCommand {
    /// Assemble a command from its already-split pieces.
    pub fn parse(
        source: &str,
        skip: i32,
        top: i32,
        select: &str,
        orderby: &str,
        filter: &str,
        parameters: HashMap<String, String>,
    ) -> QueryResult<QueryCommand> {
        let command = QueryCommand {
            source: source.to_string(),
            filter: parser::parse(filter)?,
            sorts: deserialize_descriptors(orderby),
            selects: deserialize_descriptors(select),
            skip,
            top,
            parameters,
        };

        tracing::debug!(
            "built query command for source '{}' (skip={}, top={}, sorts={}, selects={})",
            command.source,
            command.skip,
            command.top,
            command.sorts.len(),
            command.selects.len()
        );

        Ok(command)
    }

    /// Build a command from a URL query string.
    ///
    /// Consumes the conventional `$top`, `$skip`, `$filter`, `$select`,
    /// `$orderby` and `$from` parameters; everything else lands verbatim in
    /// [`QueryCommand::parameters`]. A leading `?` is tolerated. Missing or
    /// empty `$top`/`$skip` default to the -1 sentinel; non-numeric values
    /// are a build error, never a silent default.
    pub fn from_query_string(query: &str) -> QueryResult<QueryCommand> {
        Self::parse_query_string(query, None)
    }

    /// Like [`QueryCommand::from_query_string`], additionally constraining
    /// the soft-delete flag: `Deleted~eq~<show_deleted>` is ANDed onto the
    /// parsed filter as the new tree root, so it is always the outermost
    /// right-hand condition and existing filter semantics are preserved.
    pub fn from_query_string_with_deleted(
        query: &str,
        show_deleted: bool,
    ) -> QueryResult<QueryCommand> {
        Self::parse_query_string(query, Some(show_deleted))
    }

    fn parse_query_string(
        query: &str,
        show_soft_deleted: Option<bool>,
    ) -> QueryResult<QueryCommand> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut top = UNSPECIFIED;
        let mut skip = UNSPECIFIED;
        let mut filter = String::new();
        let mut select = String::new();
        let mut orderby = String::new();
        let mut source = String::new();
        let mut parameters = HashMap::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PARAM_TOP if !value.is_empty() => top = parse_paging(PARAM_TOP, &value)?,
                PARAM_SKIP if !value.is_empty() => skip = parse_paging(PARAM_SKIP, &value)?,
                PARAM_FILTER if !value.is_empty() => filter = value.into_owned(),
                PARAM_SELECT if !value.is_empty() => select = value.into_owned(),
                PARAM_ORDERBY if !value.is_empty() => orderby = value.into_owned(),
                PARAM_FROM if !value.is_empty() => source = value.into_owned(),
                key if key.starts_with('$') => {}
                key => {
                    parameters.insert(key.to_string(), value.into_owned());
                }
            }
        }

        let mut command = Self::parse(&source, skip, top, &select, &orderby, &filter, parameters)?;

        if let Some(show_deleted) = show_soft_deleted {
            command.filter = Some(with_soft_delete(command.filter.take(), show_deleted));
        }

        Ok(command)
    }
}

fn with_soft_delete(filter: Option<FilterNode>, show_deleted: bool) -> FilterNode {
    let flag = FilterNode::condition(
        SOFT_DELETE_MEMBER,
        FilterOperator::Eq,
        FilterValue::Bool(show_deleted),
    );

    match filter {
        Some(existing) => existing.and(flag),
        None => flag,
    }
}

fn parse_paging(name: &str, value: &str) -> QueryResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| QueryError::InvalidPagingValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ast::{FilterCondition, LogicalConnector};

    #[test]
    fn test_defaults() {
        let command = QueryCommand::default();
        assert_eq!(command.skip, UNSPECIFIED);
        assert_eq!(command.top, UNSPECIFIED);
        assert!(command.filter.is_none());
        assert!(command.sorts.is_empty());
        assert!(command.selects.is_empty());
    }

    #[test]
    fn test_from_query_string() {
        let command = QueryCommand::from_query_string(
            "?$from=Project&$skip=0&$top=20&$filter=Name~eq~'Test'&$orderby=Name,CreatedAt desc&$select=Id,Name&tenant=acme",
        )
        .unwrap();

        assert_eq!(command.source, "Project");
        assert_eq!(command.skip, 0);
        assert_eq!(command.top, 20);
        assert!(command.filter.is_some());
        assert_eq!(command.sorts.len(), 2);
        assert_eq!(command.selects.len(), 2);
        assert_eq!(command.parameters.get("tenant").map(String::as_str), Some("acme"));
    }

    #[test]
    fn test_missing_paging_defaults_to_sentinel() {
        let command = QueryCommand::from_query_string("$from=Project").unwrap();
        assert_eq!(command.skip, UNSPECIFIED);
        assert_eq!(command.top, UNSPECIFIED);
    }

    #[test]
    fn test_empty_paging_value_is_absent() {
        let command = QueryCommand::from_query_string("$from=Project&$top=").unwrap();
        assert_eq!(command.top, UNSPECIFIED);
    }

    #[test]
    fn test_non_numeric_paging_is_an_error() {
        let err = QueryCommand::from_query_string("$top=abc").unwrap_err();
        match err {
            QueryError::InvalidPagingValue { name, value } => {
                assert_eq!(name, "$top");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidPagingValue, got {:?}", other),
        }
    }

    #[test]
    fn test_dollar_keys_never_reach_parameters() {
        let command =
            QueryCommand::from_query_string("$from=Project&$custom=x&plain=y").unwrap();
        assert!(!command.parameters.contains_key("$custom"));
        assert!(!command.parameters.contains_key("$from"));
        assert_eq!(command.parameters.get("plain").map(String::as_str), Some("y"));
    }

    #[test]
    fn test_empty_filter_builds_match_all() {
        let command = QueryCommand::from_query_string("$from=Project").unwrap();
        assert_eq!(command.filter, None);
    }

    #[test]
    fn test_filter_parse_errors_propagate() {
        assert!(QueryCommand::from_query_string("$filter=Name~bogus~1").is_err());
    }

    #[test]
    fn test_soft_delete_is_outermost_right_leaf() {
        let command = QueryCommand::from_query_string_with_deleted(
            "$from=Project&$filter=Name~eq~'Test'",
            false,
        )
        .unwrap();

        match command.filter.unwrap() {
            FilterNode::Composite {
                right, connector, ..
            } => {
                assert_eq!(connector, LogicalConnector::And);
                assert_eq!(
                    *right,
                    FilterNode::Condition(FilterCondition {
                        member: "Deleted".to_string(),
                        operator: FilterOperator::Eq,
                        value: FilterValue::Bool(false),
                    })
                );
            }
            other => panic!("expected composite root, got {:?}", other),
        }
    }

    #[test]
    fn test_soft_delete_composes_with_empty_filter() {
        let command =
            QueryCommand::from_query_string_with_deleted("$from=Project", true).unwrap();
        assert_eq!(
            command.filter.unwrap(),
            FilterNode::condition("Deleted", FilterOperator::Eq, FilterValue::Bool(true))
        );
    }
}
