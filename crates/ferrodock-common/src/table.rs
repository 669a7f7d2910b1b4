//! Column-oriented view over pose data.
//!
//! A `PoseTable` keeps every cell as text, mirroring the CSV files it is read
//! from and written to. Numeric columns are parsed on demand; cells that do not
//! hold a finite number are treated as missing values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{FerrodockError, Result};

/// Well-known column names.
pub mod columns {
    pub const COMPLEX_NAME: &str = "complex_name";
    pub const VINA_AFFINITY: &str = "vina_affinity";
    pub const PROTEIN: &str = "protein";
    pub const POSE: &str = "pose";
    pub const RMSD_LB: &str = "rmsd_lb";
    pub const RMSD_UB: &str = "rmsd_ub";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PoseTable {
    /// Create an empty table with the given header.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a headed CSV document. Ragged rows are rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FerrodockError::InputNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Write the table as CSV. The header row is always written, even for an
    /// empty table.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Append a row; its width must match the header.
    pub fn push_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.headers.len() {
            return Err(FerrodockError::Pipeline(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Text values of a column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Numeric values of a column; unparseable cells become `None`.
    pub fn float_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| parse_float(&r[idx])).collect())
    }

    /// Add a column, or replace it if a column with that name exists.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(FerrodockError::Pipeline(format!(
                "column '{}' has {} values but table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Project onto the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Option<PoseTable> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()?;
        Some(PoseTable {
            headers: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> PoseTable {
        PoseTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Parse a cell as a finite float.
pub fn parse_float(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a float the way tabular tools do (`-9.0`, not `-9`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Round to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
