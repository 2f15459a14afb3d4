// Relational query builder
// Assembles a MySQL SELECT from a column selection, a table and condition groups.
// Values are bound as statement parameters; the inline rendering exists for logs.

use super::{ConditionGroup, FieldCondition, MatchMode, Selection};
use crate::error::{QueryError, Result};
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use std::fmt;

/// An assembled SELECT statement
///
/// `sql()` holds `?` placeholders and `params()` the values bound to them,
/// in order. Formatting the statement with `{}` gives the same text with
/// the values quoted inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    sql: String,
    inline: String,
    params: Vec<String>,
}

impl SqlStatement {
    /// Statement text with `?` placeholders
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values for the placeholders, in order
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inline)
    }
}

/// The SQL query builder
pub struct SqlQuery;

impl SqlQuery {
    /// Build `SELECT <columns> FROM <table> WHERE (<group-1>) <OP> (<group-2>) ...`
    ///
    /// Inside a group, conditions are joined with the group's own `logical`;
    /// each group after the first is prefixed with its `connector`.
    /// With no groups the WHERE clause is left out.
    pub fn build(
        select: &Selection,
        table: &str,
        groups: &[ConditionGroup],
    ) -> Result<SqlStatement> {
        let columns = Self::columns(select)?;
        if table.is_empty() {
            return Err(QueryError::invalid("Table name is empty"));
        }

        let mut params = Vec::new();
        for (i, group) in groups.iter().enumerate() {
            if group.conditions.is_empty() {
                return Err(QueryError::invalid(format!(
                    "Condition group {} has no conditions",
                    i + 1
                )));
            }
            for cond in &group.conditions {
                params.push(Self::pattern(cond)?);
            }
        }

        let sql = Self::render(&columns, table, groups, |_| "?".to_string());
        let mut values = params.iter();
        let inline = Self::render(&columns, table, groups, |_| {
            quote_literal(values.next().map(String::as_str).unwrap_or_default())
        });

        Self::check_parses(&sql)?;

        Ok(SqlStatement {
            sql,
            inline,
            params,
        })
    }

    /// Quoted column list, or `*`
    fn columns(select: &Selection) -> Result<String> {
        let names: Vec<&str> = match select {
            Selection::All => return Ok("*".to_string()),
            Selection::Column(name) => vec![name.as_str()],
            Selection::Columns(names) => names.iter().map(String::as_str).collect(),
        };

        if names.is_empty() || names.iter().any(|n| n.is_empty()) {
            return Err(QueryError::invalid("Column selection is empty"));
        }

        Ok(names
            .into_iter()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(","))
    }

    /// The bound value for a condition, with LIKE wildcards applied
    fn pattern(cond: &FieldCondition) -> Result<String> {
        if cond.field.is_empty() {
            return Err(QueryError::invalid("Field name is empty"));
        }

        let value = &cond.value;
        match cond.mode {
            MatchMode::StartsWith => Ok(format!("{}%", value)),
            MatchMode::EndsWith => Ok(format!("%{}", value)),
            MatchMode::Contain => Ok(format!("%{}%", value)),
            MatchMode::Equal => Ok(value.clone()),
            MatchMode::Exact | MatchMode::Partial => Err(QueryError::invalid(format!(
                "Unknown mode \"{}\"",
                cond.mode
            ))),
        }
    }

    /// One pass over the statement structure; `value` renders each
    /// condition's right-hand side in order
    fn render<F>(columns: &str, table: &str, groups: &[ConditionGroup], mut value: F) -> String
    where
        F: FnMut(&FieldCondition) -> String,
    {
        let mut q = vec![
            "SELECT".to_string(),
            columns.to_string(),
            format!("FROM {}", quote_ident(table)),
        ];

        if !groups.is_empty() {
            q.push("WHERE".to_string());
        }

        for (i, group) in groups.iter().enumerate() {
            let mut parts = Vec::with_capacity(group.conditions.len());
            for (ic, cond) in group.conditions.iter().enumerate() {
                let op = match cond.mode {
                    MatchMode::Equal => "=",
                    _ => "LIKE",
                };
                let clause = format!("{} {} {}", quote_ident(&cond.field), op, value(cond));

                if ic > 0 {
                    parts.push(format!("{} {}", group.logical.sql_keyword(), clause));
                } else {
                    parts.push(clause);
                }
            }

            if i > 0 {
                q.push(format!("{} ({})", group.connector.sql_keyword(), parts.join(" ")));
            } else {
                q.push(format!("({})", parts.join(" ")));
            }
        }

        q.join(" ")
    }

    /// The statement we send must be exactly one query
    fn check_parses(sql: &str) -> Result<()> {
        let ast = Parser::parse_sql(&MySqlDialect {}, sql)
            .map_err(|e| QueryError::invalid(format!("SQL parsing error: {}", e)))?;

        match ast.as_slice() {
            [Statement::Query(_)] => Ok(()),
            _ => Err(QueryError::invalid("Only single SELECT statements are supported")),
        }
    }
}

/// Backtick-quote an identifier, doubling any backtick inside it
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quote a string literal, doubling any single quote inside it
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
