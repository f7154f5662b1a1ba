//! Typed, order-preserving view of delimited input tables.
//!
//! Cells keep their source text so an exported row reproduces the input
//! exactly; typed accessors parse on demand. Each column carries a type tag
//! inferred once when the table is loaded.

mod export;
mod reader;

pub use export::{ExportRow, ExportTable, ROI_ID_COLUMN, SHAPE_ID_COLUMN};
pub use reader::{parse_delimited, quote_field};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Column type tag understood by the bulk annotation loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit integer (`l`)
    Integer,
    /// Double precision float (`d`)
    Double,
    /// Free text (`s`)
    String,
}

impl ColumnType {
    /// Single-letter tag written in the export header line.
    pub fn tag(&self) -> &'static str {
        match self {
            ColumnType::Integer => "l",
            ColumnType::Double => "d",
            ColumnType::String => "s",
        }
    }

    /// Infer the narrowest type that fits every non-empty cell.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = false;
        let mut integer = true;
        let mut double = true;

        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            seen = true;
            if integer && cell.parse::<i64>().is_err() {
                integer = false;
            }
            if double && cell.parse::<f64>().is_err() {
                double = false;
            }
            if !integer && !double {
                break;
            }
        }

        match (seen, integer, double) {
            (false, _, _) => ColumnType::String,
            (true, true, _) => ColumnType::Integer,
            (true, false, true) => ColumnType::Double,
            _ => ColumnType::String,
        }
    }
}

/// Column names and types shared by every record of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema; duplicate column names are rejected.
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>) -> Result<Self> {
        if columns.len() != types.len() {
            return Err(PipelineError::config(format!(
                "schema has {} columns but {} types",
                columns.len(),
                types.len()
            )));
        }
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PipelineError::config(format!("duplicate column '{}'", name)));
            }
        }
        Ok(Self {
            columns,
            types,
            index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Position of a column, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One input row.
#[derive(Debug, Clone)]
pub struct Record {
    origin: usize,
    schema: Arc<Schema>,
    fields: Vec<String>,
}

impl Record {
    /// Zero-based position of this row in the input, excluding the header.
    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Raw text of a field, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .position(column)
            .map(|i| self.fields[i].as_str())
    }

    /// Raw text of a field, failing if the column does not exist.
    pub fn text(&self, column: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| {
            PipelineError::config(format!("row {}: unknown column '{}'", self.origin, column))
        })
    }

    /// Field parsed as a double.
    pub fn f64(&self, column: &str) -> Result<f64> {
        let raw = self.text(column)?;
        raw.trim().parse().map_err(|_| {
            PipelineError::config(format!(
                "row {}: column '{}' is not numeric ('{}')",
                self.origin, column, raw
            ))
        })
    }

    /// Field parsed as an integer. Integral doubles such as `3.0` are accepted.
    pub fn i64(&self, column: &str) -> Result<i64> {
        let raw = self.text(column)?;
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
            _ => Err(PipelineError::config(format!(
                "row {}: column '{}' is not an integer ('{}')",
                self.origin, column, raw
            ))),
        }
    }
}

/// Parsed table, rows in file order.
#[derive(Debug, Clone)]
pub struct RecordTable {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl RecordTable {
    /// Build a table from a header and raw rows, inferring column types.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                // +2: 1-based, plus the header line
                return Err(PipelineError::table(
                    i + 2,
                    format!("expected {} fields, found {}", columns.len(), row.len()),
                ));
            }
        }

        let types = (0..columns.len())
            .map(|c| ColumnType::infer(rows.iter().map(|r| r[c].as_str())))
            .collect();
        let schema = Arc::new(Schema::new(columns, types)?);

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(origin, fields)| Record {
                origin,
                schema: Arc::clone(&schema),
                fields,
            })
            .collect();

        Ok(Self { schema, records })
    }

    /// Parse delimited text whose first line is the header.
    pub fn parse(text: &str, delimiter: char) -> Result<Self> {
        let mut rows = parse_delimited(text, delimiter)?;
        if rows.is_empty() {
            return Err(PipelineError::table(1, "missing header line"));
        }
        let header = rows.remove(0);
        let columns = header.into_iter().map(|c| c.trim().to_string()).collect();
        Self::from_rows(columns, rows)
    }

    /// Read and parse a delimited file.
    pub fn read(path: &Path, delimiter: char) -> Result<Self> {
        log::debug!("Reading table {:?}", path);
        let text = std::fs::read_to_string(path)?;
        let table = Self::parse(&text, delimiter)?;
        log::info!(
            "Loaded {} rows x {} columns from {:?}",
            table.len(),
            table.schema.len(),
            path
        );
        Ok(table)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fail early if any of `columns` is absent.
    pub fn require_columns<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for column in columns {
            if self.schema.position(column).is_none() {
                return Err(PipelineError::config(format!(
                    "input table has no column '{}'",
                    column
                )));
            }
        }
        Ok(())
    }
}
