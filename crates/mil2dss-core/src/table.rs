//! Row-oriented tabular values.
//!
//! The vendor export is a bundle of delimited text files; each parses into a
//! [`Table`]. Header-bearing tables carry column names from the start,
//! header-less tables stay positional until the schema binder installs names
//! taken from the headings tables. Equipment catalogs remain `Table`s for
//! their whole life and live on the graph as side data, which is why the
//! type sits in the core crate rather than next to the file parsing.

use serde::Serialize;

/// A rectangular block of string cells with optional column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// A table with named columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// A header-less table; cells are addressed by position until
    /// [`Table::rename`] installs names.
    pub fn positional() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Install (or replace) the column names. Used by the schema binder
    /// after slicing a header-less table by class code.
    pub fn rename(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row { table: self, cells })
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell by column name; `None` when the column is unknown or the row is
    /// ragged short of it.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.table
            .col_index(name)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
    }

    /// Cell by position, for header-less tables.
    pub fn get_at(&self, index: usize) -> Option<&'a str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Cell by name, trimmed; empty cells become `None`.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Cell parsed as f64 (trimmed). Unparsable or empty cells are `None`.
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.text(name)?.parse().ok()
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["id".into(), "kv".into(), "name".into()]);
        t.push_row(vec!["b1".into(), "11".into(), "Feeder A".into()]);
        t.push_row(vec!["b2".into(), "".into(), "Feeder B".into()]);
        t
    }

    #[test]
    fn test_lookup_by_name() {
        let t = sample();
        let row = t.row(0).unwrap();
        assert_eq!(row.get("id"), Some("b1"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_numeric_parsing() {
        let t = sample();
        assert_eq!(t.row(0).unwrap().f64("kv"), Some(11.0));
        // Empty cell parses to None, not 0.
        assert_eq!(t.row(1).unwrap().f64("kv"), None);
    }

    #[test]
    fn test_positional_then_rename() {
        let mut t = Table::positional();
        t.push_row(vec!["7".into(), "1".into(), "x".into()]);
        assert_eq!(t.row(0).unwrap().get_at(1), Some("1"));
        assert_eq!(t.row(0).unwrap().get("code"), None);

        t.rename(vec!["gid".into(), "code".into(), "name".into()]);
        assert_eq!(t.row(0).unwrap().get("code"), Some("1"));
    }

    #[test]
    fn test_ragged_row_is_not_an_error() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec!["only".into()]);
        let row = t.row(0).unwrap();
        assert_eq!(row.get("a"), Some("only"));
        assert_eq!(row.get("b"), None);
    }

    #[test]
    fn test_text_trims_and_drops_empty() {
        let mut t = Table::new(vec!["v".into()]);
        t.push_row(vec!["  padded  ".into()]);
        t.push_row(vec!["   ".into()]);
        assert_eq!(t.row(0).unwrap().text("v"), Some("padded"));
        assert_eq!(t.row(1).unwrap().text("v"), None);
    }
}
