// queex - build and run simple queries against MongoDB or MySQL
// This is the library root that exposes the public API

pub mod config;
pub mod connector;
pub mod error;
pub mod query;
pub mod row;

// Re-export commonly used types for convenience
pub use config::Config;
pub use connector::{Backend, Connector, DriverConnector};
pub use error::{QueryError, Result};
pub use query::{
    compile_filter, BackendKind, ConditionGroup, DocumentResults, FieldCondition, Logical,
    MatchMode, QueryExecutor, Selection, SqlQuery, SqlStatement,
};
pub use row::{Row, RowSet, Value};
