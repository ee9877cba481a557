//! smartquery - Storage-independent smart filter query compiler.
//!
//! Turns a flat, URL-safe query string into a backend-neutral
//! [`QueryCommand`] (filter AST, sort list, projection list, pagination) and
//! renders or evaluates that command against one of three targets: a
//! relational SQL dialect, a search-index dialect, or direct in-memory
//! evaluation over a sequence of values.
//!
//! # Main Components
//!
//! - **Filter grammar**: `member~opcode~literal` comparisons joined with
//!   `and`/`or` and grouped with parentheses, parsed into a [`FilterNode`]
//!   tree
//! - **Descriptors**: sort and projection lists with a compact comma-joined
//!   string encoding
//! - **Command builder**: [`QueryCommand`] constructors consuming the
//!   conventional `$top`/`$skip`/`$filter`/`$select`/`$orderby`/`$from`
//!   query-string parameters
//! - **Renderers**: [`SqlFormatter`], [`SearchFormatter`] and the in-memory
//!   [`evaluate`] function
//!
//! # Example
//!
//! ```rust
//! use smartquery::{QueryCommand, SqlFormatter};
//!
//! let command = QueryCommand::from_query_string(
//!     "?$from=Project&$filter=Name~eq~'Test'&$orderby=Name&$skip=0&$top=20",
//! ).unwrap();
//!
//! let sql = SqlFormatter::format(&command).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM Project WHERE Name = 'Test' ORDER BY Name asc OFFSET 0 ROWS FETCH NEXT 20 ROWS ONLY"
//! );
//! ```

pub mod command;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod filter;
pub mod formatter;

// Re-export main types for convenience
pub use command::{QueryCommand, UNSPECIFIED};
pub use descriptor::{
    deserialize_descriptors, serialize_descriptors, Descriptor, SelectDescriptor, SortDescriptor,
    SortDirection,
};
pub use error::{QueryError, QueryResult};
pub use executor::{evaluate, EvaluatedPage};
pub use filter::parser::parse as parse_filter;
pub use filter::{FilterCondition, FilterNode, FilterOperator, FilterValue, LogicalConnector};
pub use formatter::{SearchFormatter, SqlFormatter};
