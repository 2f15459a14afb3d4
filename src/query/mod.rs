// Query module - the condition vocabulary and the two query builders
pub mod document;
pub mod executor;
pub mod relational;

pub use document::{compile_filter, DocumentResults};
pub use executor::QueryExecutor;
pub use relational::{SqlQuery, SqlStatement};

use crate::error::{QueryError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which backend a match mode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Mongo,
    MySql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Mongo => write!(f, "mongo"),
            BackendKind::MySql => write!(f, "mysql"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mongo" => Ok(BackendKind::Mongo),
            "mysql" => Ok(BackendKind::MySql),
            _ => Err(QueryError::invalid(format!("Unknown backend \"{}\"", s))),
        }
    }
}

/// How a value is matched against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// MongoDB: value must match exactly
    Exact,
    /// MongoDB: case-insensitive substring match
    Partial,
    /// MySQL: field starts with value
    StartsWith,
    /// MySQL: field ends with value
    EndsWith,
    /// MySQL: field contains value
    Contain,
    /// MySQL: field equals value
    Equal,
}

impl MatchMode {
    /// The backend this mode is defined for
    pub fn backend(self) -> BackendKind {
        match self {
            MatchMode::Exact | MatchMode::Partial => BackendKind::Mongo,
            MatchMode::StartsWith | MatchMode::EndsWith | MatchMode::Contain | MatchMode::Equal => {
                BackendKind::MySql
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Partial => "partial",
            MatchMode::StartsWith => "startswith",
            MatchMode::EndsWith => "endswith",
            MatchMode::Contain => "contain",
            MatchMode::Equal => "equal",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(MatchMode::Exact),
            "partial" => Ok(MatchMode::Partial),
            "startswith" => Ok(MatchMode::StartsWith),
            "endswith" => Ok(MatchMode::EndsWith),
            "contain" => Ok(MatchMode::Contain),
            "equal" => Ok(MatchMode::Equal),
            _ => Err(QueryError::invalid(format!("Unknown mode \"{}\"", s))),
        }
    }
}

/// Connector used to combine conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logical {
    #[default]
    Or,
    And,
}

impl Logical {
    /// Operator name in a MongoDB filter
    pub fn mongo_operator(self) -> &'static str {
        match self {
            Logical::Or => "$or",
            Logical::And => "$and",
        }
    }

    /// Keyword in a SQL WHERE clause
    pub fn sql_keyword(self) -> &'static str {
        match self {
            Logical::Or => "OR",
            Logical::And => "AND",
        }
    }
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logical::Or => write!(f, "or"),
            Logical::And => write!(f, "and"),
        }
    }
}

impl FromStr for Logical {
    type Err = QueryError;

    /// Accepts `or`/`and` in any case, and the MongoDB spellings `$or`/`$and`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('$').to_ascii_lowercase().as_str() {
            "or" => Ok(Logical::Or),
            "and" => Ok(Logical::And),
            _ => Err(QueryError::invalid(format!("Unknown logical \"{}\"", s))),
        }
    }
}

/// A single condition: field, value and how to match it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub field: String,
    pub value: String,
    pub mode: MatchMode,
}

impl FieldCondition {
    pub fn new(field: impl Into<String>, value: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            mode,
        }
    }
}

impl FromStr for FieldCondition {
    type Err = QueryError;

    /// Parse `field=value:mode`. The value runs from the first `=`
    /// to the last `:`, so it may itself contain either character.
    fn from_str(s: &str) -> Result<Self> {
        let (field, rest) = s
            .split_once('=')
            .ok_or_else(|| QueryError::invalid(format!("Expected field=value:mode, got \"{}\"", s)))?;
        let (value, mode) = rest
            .rsplit_once(':')
            .ok_or_else(|| QueryError::invalid(format!("Missing mode for field \"{}\"", field)))?;

        if field.is_empty() {
            return Err(QueryError::invalid(format!("Empty field name in \"{}\"", s)));
        }

        Ok(FieldCondition::new(field, value, mode.parse()?))
    }
}

/// A parenthesized group of conditions in a WHERE clause (MySQL only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    /// Joins this group to the groups before it. Ignored on the first group.
    pub connector: Logical,
    /// Joins the conditions inside the group
    pub logical: Logical,
    pub conditions: Vec<FieldCondition>,
}

impl ConditionGroup {
    /// A group joined to earlier groups with OR
    pub fn new(logical: Logical, conditions: Vec<FieldCondition>) -> Self {
        Self {
            connector: Logical::Or,
            logical,
            conditions,
        }
    }

    /// Set how this group joins the groups before it
    pub fn joined_with(mut self, connector: Logical) -> Self {
        self.connector = connector;
        self
    }

    /// Decode a group from its JSON form:
    ///
    /// ```json
    /// {"logical": "and",
    ///  "conditions": [["logical", "and"], ["nama", ["hidayat", "endswith"]]]}
    /// ```
    ///
    /// The outer `logical` is optional (defaults to `or`); the leading
    /// `["logical", ...]` entry of `conditions` is mandatory and sets the
    /// connector used inside the group.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawGroup = serde_json::from_str(text)
            .map_err(|e| QueryError::invalid(format!("Malformed condition group: {}", e)))?;
        raw.try_into()
    }
}

impl FromStr for ConditionGroup {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        ConditionGroup::from_json(s)
    }
}

/// Wire shape of a condition group before validation
#[derive(Deserialize)]
struct RawGroup {
    logical: Option<String>,
    conditions: Vec<(String, RawEntry)>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Logical(String),
    Condition(String, String),
}

impl TryFrom<RawGroup> for ConditionGroup {
    type Error = QueryError;

    fn try_from(raw: RawGroup) -> Result<Self> {
        let connector = match raw.logical {
            Some(l) => l.parse()?,
            None => Logical::Or,
        };

        let mut entries = raw.conditions.into_iter();
        let logical = match entries.next() {
            Some((key, RawEntry::Logical(l))) if key == "logical" => l.parse()?,
            _ => {
                return Err(QueryError::invalid(
                    "Condition group must start with a [\"logical\", \"or\"|\"and\"] entry",
                ))
            }
        };

        let mut conditions = Vec::new();
        for (field, entry) in entries {
            match entry {
                RawEntry::Condition(value, mode) if field != "logical" => {
                    conditions.push(FieldCondition::new(field, value, mode.parse()?));
                }
                _ => {
                    return Err(QueryError::invalid(format!(
                        "Unexpected entry \"{}\" in condition group",
                        field
                    )))
                }
            }
        }

        Ok(ConditionGroup {
            connector,
            logical,
            conditions,
        })
    }
}

/// Which columns a SELECT returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `*`
    All,
    Column(String),
    Columns(Vec<String>),
}

impl FromStr for Selection {
    type Err = QueryError;

    /// `*` selects everything; otherwise a comma-separated list of columns
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(Selection::All);
        }

        let columns: Vec<String> = s.split(',').map(|c| c.trim().to_string()).collect();
        if columns.iter().any(|c| c.is_empty()) {
            return Err(QueryError::invalid(format!("Invalid column list \"{}\"", s)));
        }

        if columns.len() == 1 {
            Ok(Selection::Column(columns.into_iter().next().unwrap_or_default()))
        } else {
            Ok(Selection::Columns(columns))
        }
    }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self {
        if s == "*" {
            Selection::All
        } else {
            Selection::Column(s.to_string())
        }
    }
}

impl From<Vec<&str>> for Selection {
    fn from(columns: Vec<&str>) -> Self {
        Selection::Columns(columns.into_iter().map(String::from).collect())
    }
}
