//! Column-named tabular data exchanged between importer, store and export

/// Rows of text cells under ordered column names
///
/// Every row has exactly one cell per column. Missing values are empty
/// strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    /// Create an empty record set with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for column in columns {
            set.ensure_column(&column.into());
        }
        set
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Append a row, padding short rows with blanks and dropping surplus cells
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Add a blank column unless it already exists
    pub fn ensure_column(&mut self, name: &str) {
        if self.column_index(name).is_none() {
            self.columns.push(name.to_string());
            for row in &mut self.rows {
                row.push(String::new());
            }
        }
    }

    /// Concatenate another record set below this one
    ///
    /// Columns are the union of both sets in first-seen order; cells a source
    /// does not carry are left blank.
    pub fn append(&mut self, other: RecordSet) {
        for column in &other.columns {
            self.ensure_column(column);
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut target = vec![String::new(); self.columns.len()];
            for (value, &index) in row.into_iter().zip(&mapping) {
                target[index] = value;
            }
            self.rows.push(target);
        }
    }

    /// Distinct values of a column in first-seen order
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let Some(index) = self.column_index(column) else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut values = Vec::new();
        for row in &self.rows {
            let value = row[index].as_str();
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }
        values
    }
}
