//! Export table for bulk annotation registration.
//!
//! Layout:
//!
//! ```text
//! # header x_um_abs,d,chr,l,roi_id,l,shape_id,l
//! x_um_abs,chr,roi_id,shape_id
//! 10.5,1,501,9001
//! ```

use std::path::Path;

use crate::error::Result;
use crate::model::{RoiId, ShapeId};
use crate::table::reader::quote_field;
use crate::table::{ColumnType, Record, Schema};

/// Column appended with the id of the ROI a row's shape belongs to.
pub const ROI_ID_COLUMN: &str = "roi_id";

/// Column appended with the id of the row's shape.
pub const SHAPE_ID_COLUMN: &str = "shape_id";

/// One input row with the identifiers of its persisted shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// Origin index of the source record.
    pub origin: usize,
    /// Source fields, unchanged.
    pub fields: Vec<String>,
    pub roi_id: RoiId,
    pub shape_id: ShapeId,
}

impl ExportRow {
    pub fn new(record: &Record, roi_id: RoiId, shape_id: ShapeId) -> Self {
        Self {
            origin: record.origin(),
            fields: record.fields().to_vec(),
            roi_id,
            shape_id,
        }
    }
}

/// Immutable export table: source columns plus `roi_id` and `shape_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Build the table. Rows are put back into source order by origin index.
    pub fn new(schema: &Schema, mut rows: Vec<ExportRow>) -> Self {
        rows.sort_by_key(|r| r.origin);

        let mut columns = schema.columns().to_vec();
        columns.push(ROI_ID_COLUMN.to_string());
        columns.push(SHAPE_ID_COLUMN.to_string());

        let mut types = schema.types().to_vec();
        types.push(ColumnType::Integer);
        types.push(ColumnType::Integer);

        Self {
            columns,
            types,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The leading type-declaration line, without trailing newline.
    pub fn header_line(&self) -> String {
        let pairs: Vec<String> = self
            .columns
            .iter()
            .zip(&self.types)
            .map(|(name, ty)| format!("{},{}", quote_field(name, ','), ty.tag()))
            .collect();
        format!("# header {}", pairs.join(","))
    }

    /// Render the complete export file.
    pub fn to_delimited(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header_line());
        out.push('\n');

        let names: Vec<String> = self.columns.iter().map(|c| quote_field(c, ',')).collect();
        out.push_str(&names.join(","));
        out.push('\n');

        for row in &self.rows {
            let mut cells: Vec<String> = row.fields.iter().map(|f| quote_field(f, ',')).collect();
            cells.push(row.roi_id.to_string());
            cells.push(row.shape_id.to_string());
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the export file to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_delimited())?;
        log::info!("Wrote {} export rows to {:?}", self.rows.len(), path);
        Ok(())
    }
}
