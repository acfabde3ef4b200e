//! Tabular query results.

use crate::datatypes::Value;
use serde::{Deserialize, Serialize};

/// A single result row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Named columns plus rows, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl DataSet {
    pub fn new(column_names: Vec<String>) -> Self {
        Self {
            column_names,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn clear(&mut self) {
        self.column_names.clear();
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_rows() {
        let mut ds = DataSet::new(vec!["name".to_string(), "age".to_string()]);
        ds.push_row(Row::new(vec![Value::string("Tim"), Value::Int(42)]));
        ds.push_row(Row::new(vec![Value::string("Ann"), Value::Null]));

        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.rows[1].values[1], Value::Null);

        ds.clear();
        assert_eq!(ds, DataSet::default());
    }
}
