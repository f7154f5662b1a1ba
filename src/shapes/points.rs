//! Point shapes from grouped measurement records.

use serde::{Deserialize, Serialize};

use crate::coords::{Calibration, CoordinateMapper};
use crate::error::Result;
use crate::grouping::Group;
use crate::model::{Palette, PointShape, Rgba, Shape};
use crate::table::Record;
use crate::template::Template;

fn default_label() -> Template {
    Template::parse("{cell_id} chr{chr}").expect("default label template should parse")
}

fn default_style_column() -> Option<String> {
    Some("chr".to_string())
}

/// Labelling and coloring of point shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    /// Label template; placeholders name input columns.
    #[serde(default = "default_label")]
    pub label: Template,

    /// Integer column holding the 1-based palette index.
    #[serde(default = "default_style_column")]
    pub style_column: Option<String>,

    #[serde(default)]
    pub palette: Palette,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            label: default_label(),
            style_column: default_style_column(),
            palette: Palette::default(),
        }
    }
}

impl PointStyle {
    /// Columns the style reads (label placeholders and the style column).
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.label.fields().collect();
        if let Some(c) = &self.style_column {
            columns.push(c.as_str());
        }
        columns
    }

    fn render_label(&self, record: &Record) -> Result<String> {
        self.label.render(|name| record.get(name).map(str::trim))
    }

    /// Palette color for a record; `None` when the index is unusable.
    fn color(&self, record: &Record) -> Option<Rgba> {
        let column = self.style_column.as_deref()?;
        let index = record.i64(column).ok()?;
        self.palette.get(index)
    }
}

/// Build one point per record of `group`, in the group's record order.
///
/// Pure: the same inputs always produce the same shapes.
pub fn build_points(
    group: &Group<'_>,
    mapper: &CoordinateMapper,
    calibration: Option<&Calibration>,
    style: &PointStyle,
) -> Result<Vec<Shape>> {
    let shapes = group
        .records
        .iter()
        .map(|record| {
            let mapped = mapper.map(record, calibration)?;
            let color = style.color(record);
            Ok(Shape::Point(PointShape {
                x: mapped.x,
                y: mapped.y,
                z: mapped.z,
                t: mapped.t,
                label: style.render_label(record)?,
                stroke_color: color,
                fill_color: color,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Group {}: built {} points", group.key, shapes.len());
    Ok(shapes)
}
