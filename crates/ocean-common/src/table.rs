//! Column tables for point observations (ARGO profiles, zone polygons).

use std::collections::HashMap;

use crate::error::{DatasetError, DatasetResult};

/// A single table column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Every cell parsed as a number; empty cells are NaN
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    /// Infer the column type from raw cells.
    pub fn infer(cells: Vec<String>) -> Self {
        let parsed: Option<Vec<f64>> = cells.iter().map(|c| parse_cell(c)).collect();
        match parsed {
            Some(values) => Column::Numeric(values),
            None => Column::Text(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Column::Text(v) => Some(v),
            Column::Numeric(_) => None,
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Some(f64::NAN);
    }
    trimmed.parse().ok()
}

/// Ordered set of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: HashMap<String, Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a header row and string records, inferring column types.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> DatasetResult<Self> {
        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(records.len()); headers.len()];
        for (row, record) in records.into_iter().enumerate() {
            if record.len() != headers.len() {
                return Err(DatasetError::Shape(format!(
                    "row {} has {} fields, expected {}",
                    row,
                    record.len(),
                    headers.len()
                )));
            }
            for (col, value) in record.into_iter().enumerate() {
                cells[col].push(value);
            }
        }

        let mut table = Table::new();
        for (name, column) in headers.into_iter().zip(cells) {
            table.push_column(name, Column::infer(column))?;
        }
        Ok(table)
    }

    /// Append a column; its length must match the existing rows.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> DatasetResult<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(DatasetError::NameConflict(name));
        }
        if !self.names.is_empty() && column.len() != self.n_rows() {
            return Err(DatasetError::Shape(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows()
            )));
        }
        self.names.push(name.clone());
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.names
            .first()
            .and_then(|n| self.columns.get(n))
            .map_or(0, Column::len)
    }

    pub fn column(&self, name: &str) -> DatasetResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    /// Values of a numeric column.
    pub fn numeric(&self, name: &str) -> DatasetResult<&[f64]> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| DatasetError::NotNumeric(name.to_string()))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> DatasetResult<()> {
        if self.columns.contains_key(to) {
            return Err(DatasetError::NameConflict(to.to_string()));
        }
        let column = self
            .columns
            .remove(from)
            .ok_or_else(|| DatasetError::MissingColumn(from.to_string()))?;
        self.columns.insert(to.to_string(), column);
        for name in self.names.iter_mut().filter(|n| n.as_str() == from) {
            *name = to.to_string();
        }
        Ok(())
    }

    /// Keep only the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Table> {
        let mut out = Table::new();
        for name in names {
            out.push_column(name.as_ref(), self.column(name.as_ref())?.clone())?;
        }
        Ok(out)
    }

    /// Keep the rows for which `keep(row)` holds.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let rows: Vec<usize> = (0..self.n_rows()).filter(|&i| keep(i)).collect();
        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, col)| (name.clone(), col.take(&rows)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn profiles() -> Table {
        Table::from_records(
            strings(&["zone", "year", "tem"]),
            vec![
                strings(&["SCS", "2017", "28.1"]),
                strings(&["SULU", "2018", ""]),
                strings(&["SORTIENA", "2018", "27.5"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_inference() {
        let table = profiles();
        assert!(table.column("zone").unwrap().as_text().is_some());
        let tem = table.numeric("tem").unwrap();
        assert_eq!(tem[0], 28.1);
        assert!(tem[1].is_nan());
        assert!(matches!(table.numeric("zone"), Err(DatasetError::NotNumeric(_))));
    }

    #[test]
    fn test_filter_rows() {
        let table = profiles();
        let zones = table.column("zone").unwrap().as_text().unwrap().to_vec();
        let kept = table.filter_rows(|i| zones[i] != "SORTIENA");
        assert_eq!(kept.n_rows(), 2);
        assert_eq!(kept.numeric("year").unwrap(), &[2017.0, 2018.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::from_records(strings(&["a", "b"]), vec![strings(&["1"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_columns() {
        let table = profiles();
        let selected = table.select(&["tem", "zone"]).unwrap();
        assert_eq!(selected.column_names(), &["tem", "zone"]);
        assert!(matches!(table.select(&["depth"]), Err(DatasetError::MissingColumn(_))));
    }

    #[test]
    fn test_rename_column_keeps_order() {
        let mut table = profiles();
        table.rename_column("tem", "temperature").unwrap();
        assert_eq!(table.column_names(), &["zone", "year", "temperature"]);
    }
}
