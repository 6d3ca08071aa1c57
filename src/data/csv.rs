//! Dense CSV dataset
//!
//! Every column is a numeric feature. The first row can be a header
//! (automatically detected), blank lines and `#` comments are skipped.

use crate::core::{Dataset, KdacError, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dense dataset held as one row of features per sample
#[derive(Debug, Clone)]
pub struct MatrixDataset {
    rows: Vec<Vec<f64>>,
    dimensions: usize,
    header: Option<Vec<String>>,
}

impl MatrixDataset {
    /// Build a dataset from an n x d matrix
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let rows = matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        Self {
            rows,
            dimensions: matrix.ncols(),
            header: None,
        }
    }

    /// Load a dataset from a CSV file
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader, detecting a header row
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load a dataset from a reader with explicit header option
    pub fn from_reader_with_options<R: BufRead>(
        reader: R,
        auto_detect_header: bool,
    ) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut header = None;
        let mut dimensions = 0;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if rows.is_empty() && header.is_none() && auto_detect_header && Self::is_header_line(line)
            {
                header = Some(line.split(',').map(|f| f.trim().to_string()).collect());
                continue;
            }

            let row = Self::parse_data_line(line, line_no + 1)?;
            if rows.is_empty() {
                dimensions = row.len();
            } else if row.len() != dimensions {
                return Err(KdacError::ParseError(format!(
                    "Line {}: expected {} fields, found {}",
                    line_no + 1,
                    dimensions,
                    row.len()
                )));
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(KdacError::Input("Dataset contains no samples".to_string()));
        }

        Ok(Self {
            rows,
            dimensions,
            header,
        })
    }

    /// Column names, if the file had a header row
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Features of sample `i`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// A line is a header when most of its fields are not numbers
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split(',').collect();
        let non_numeric = fields
            .iter()
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();
        non_numeric * 2 > fields.len()
    }

    fn parse_data_line(line: &str, line_no: usize) -> Result<Vec<f64>> {
        line.split(',')
            .enumerate()
            .map(|(col, field)| {
                let field = field.trim();
                field.parse::<f64>().map_err(|_| {
                    KdacError::ParseError(format!(
                        "Line {line_no}: invalid value at column {}: {field:?}",
                        col + 1
                    ))
                })
            })
            .collect()
    }
}

impl Dataset for MatrixDataset {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows.len(), self.dimensions, |i, j| self.rows[i][j])
    }
}
