// Result rows
// Rows returned from the relational backend, independent of the driver

use std::fmt;

/// Represents a single row returned by a SELECT
/// Each Value is one column, in the order the columns were selected
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The full result of a relational query: column names plus every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Self { column_names, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Format the row set as a box-drawn table for display
    pub fn format(&self) -> String {
        if self.rows.is_empty() {
            return "No rows found".to_string();
        }

        // Rows can be wider than the header when the driver gives no column names
        let width_count = self
            .rows
            .iter()
            .map(|r| r.values.len())
            .max()
            .unwrap_or(0)
            .max(self.column_names.len());

        let mut widths = vec![0usize; width_count];
        for (i, name) in self.column_names.iter().enumerate() {
            widths[i] = name.chars().count();
        }
        for row in &self.rows {
            for (i, value) in row.values.iter().enumerate() {
                widths[i] = widths[i].max(value.to_string().chars().count());
            }
        }

        let mut result = String::new();
        result.push_str(&border(&widths, '┌', '┬', '┐'));

        if !self.column_names.is_empty() {
            let header: Vec<String> = (0..widths.len())
                .map(|i| self.column_names.get(i).cloned().unwrap_or_default())
                .collect();
            result.push_str(&line(&header, &widths));
            result.push_str(&border(&widths, '├', '┼', '┤'));
        }

        for row in &self.rows {
            let cells: Vec<String> = (0..widths.len())
                .map(|i| row.values.get(i).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            result.push_str(&line(&cells, &widths));
        }

        result.push_str(&border(&widths, '└', '┴', '┘'));
        result.push_str(&format!("\n{} row(s) returned", self.rows.len()));

        result
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("│");
    for (cell, width) in cells.iter().zip(widths) {
        out.push_str(&format!(" {:<width$} │", cell, width = width));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Text("riki".into()).to_string(), "riki");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(RowSet::default().format(), "No rows found");
    }

    #[test]
    fn test_format_table() {
        let set = RowSet::new(
            vec!["nama".into(), "jenis_kelamin".into()],
            vec![
                Row::new(vec![Value::Text("riki".into()), Value::Text("L".into())]),
                Row::new(vec![Value::Text("ani".into()), Value::Null]),
            ],
        );

        let out = set.format();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "┌──────┬───────────────┐");
        assert_eq!(lines[1], "│ nama │ jenis_kelamin │");
        assert_eq!(lines[3], "│ riki │ L             │");
        assert_eq!(lines[4], "│ ani  │ NULL          │");
        assert!(out.ends_with("2 row(s) returned"));
    }
}
