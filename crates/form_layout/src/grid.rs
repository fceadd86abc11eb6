//! Grid description of a declarative layout
//!
//! A layout is a list of rows, each row a list of cells. A cell names a
//! property, or holds a nested group with rows of its own. Every level is
//! translated into a CSS-grid style container: `auto` columns, `1fr` rows and
//! one template-areas line per row.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LayoutError, LayoutResult};

/// Grid placeholder for an unused cell
pub const EMPTY_CELL: &str = ".";

/// One cell of a layout level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Grid area name (the property name for plain cells)
    pub area: String,
    /// Declared property, absent for anonymous groups
    pub prop: Option<String>,
    /// Extra item style declared on the cell
    pub item: Map<String, Value>,
    /// Nested level for group cells
    pub group: Option<Box<Layout>>,
}

impl LayoutItem {
    /// Item style with its grid area applied
    pub fn style(&self) -> Map<String, Value> {
        let mut style = self.item.clone();
        style.insert("gridArea".into(), Value::String(self.area.clone()));
        style
    }
}

/// Container properties of one layout level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridContainer {
    pub grid_template_columns: String,
    pub grid_template_rows: String,
    /// One entry per row, cells separated by spaces
    pub grid_template_areas: Vec<String>,
    /// Other declared container styles, passed through untouched
    pub extra: Map<String, Value>,
}

impl GridContainer {
    /// Template areas in CSS form: each row quoted, rows space separated
    pub fn template_areas(&self) -> String {
        self.grid_template_areas
            .iter()
            .map(|row| format!("\"{row}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Placement of a property inside a layout level
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlacement<'a> {
    pub area: &'a str,
    pub row: usize,
    pub column: usize,
    pub span: usize,
    pub item: &'a LayoutItem,
}

/// One translated layout level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub rows: Vec<Vec<LayoutItem>>,
    pub max_columns: usize,
    pub row_count: usize,
    pub container: GridContainer,
}

impl Layout {
    /// Translate rows of prop names
    pub fn new<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|prop| {
                        let prop = prop.into();
                        LayoutItem {
                            area: prop.clone(),
                            prop: Some(prop),
                            item: Map::new(),
                            group: None,
                        }
                    })
                    .collect()
            })
            .collect();
        Self::build(rows, &Map::new())
    }

    /// Translate a JSON layout declaration
    pub fn from_value(value: &Value) -> LayoutResult<Self> {
        let rows = value.as_array().ok_or(LayoutError::NotArray)?;
        Self::parse_level(rows, &Map::new())
    }

    /// Stretch every row to at least `max_columns` cells
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        if max_columns <= self.max_columns {
            return self;
        }
        if self.container.grid_template_columns == auto_columns(self.max_columns) {
            self.container.grid_template_columns = auto_columns(max_columns);
        }
        self.container.grid_template_areas = self
            .rows
            .iter()
            .map(|row| area_line(row, max_columns))
            .collect();
        self.max_columns = max_columns;
        self
    }

    fn parse_level(rows: &[Value], container: &Map<String, Value>) -> LayoutResult<Self> {
        let mut parsed = Vec::with_capacity(rows.len());
        for (r, row) in rows.iter().enumerate() {
            let cells = row.as_array().ok_or_else(|| {
                log::error!("layout row {} is not an array: {}", r, row);
                LayoutError::RowNotArray(r)
            })?;
            let mut items = Vec::with_capacity(cells.len());
            for (c, cell) in cells.iter().enumerate() {
                items.push(Self::parse_cell(cell, r, c)?);
            }
            parsed.push(items);
        }
        Ok(Self::build(parsed, container))
    }

    fn parse_cell(cell: &Value, row: usize, column: usize) -> LayoutResult<LayoutItem> {
        match cell {
            Value::String(prop) => Ok(LayoutItem {
                area: prop.clone(),
                prop: Some(prop.clone()),
                item: Map::new(),
                group: None,
            }),
            Value::Object(cell) => {
                let prop = cell.get("prop").and_then(Value::as_str).map(str::to_string);
                let container = object_of(cell.get("container"));
                let group = match cell.get("group") {
                    Some(Value::Array(rows)) => {
                        Some(Box::new(Self::parse_level(rows, &container)?))
                    }
                    Some(_) => return Err(LayoutError::InvalidCell { row, column }),
                    None => None,
                };
                if prop.is_none() && group.is_none() {
                    return Err(LayoutError::InvalidCell { row, column });
                }
                Ok(LayoutItem {
                    area: prop.clone().unwrap_or_else(|| format!("group-{row}-{column}")),
                    prop,
                    item: object_of(cell.get("item")),
                    group,
                })
            }
            _ => Err(LayoutError::InvalidCell { row, column }),
        }
    }

    fn build(rows: Vec<Vec<LayoutItem>>, container: &Map<String, Value>) -> Self {
        let max_columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let grid_template_areas = rows.iter().map(|row| area_line(row, max_columns)).collect();

        let declared = |key: &str| container.get(key).and_then(Value::as_str).map(str::to_string);
        let extra = container
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "gridTemplateColumns" | "gridTemplateRows"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            container: GridContainer {
                grid_template_columns: declared("gridTemplateColumns")
                    .unwrap_or_else(|| auto_columns(max_columns)),
                grid_template_rows: declared("gridTemplateRows")
                    .unwrap_or_else(|| format!("repeat({row_count}, 1fr)")),
                grid_template_areas,
                extra,
            },
            rows,
            max_columns,
            row_count,
        }
    }

    /// Locate `prop` on this level
    pub fn find_layout_by_prop(&self, prop: &str) -> Option<GridPlacement<'_>> {
        for (r, row) in self.rows.iter().enumerate() {
            let Some(item) = row.iter().find(|item| item.prop.as_deref() == Some(prop)) else {
                continue;
            };
            let filled = self.container.grid_template_areas.get(r)?;
            let cells: Vec<&str> = filled.split(' ').collect();
            let column = cells.iter().position(|c| *c == item.area)?;
            let span = cells[column..].iter().take_while(|c| **c == item.area).count();
            return Some(GridPlacement {
                area: &item.area,
                row: r,
                column,
                span,
                item,
            });
        }
        None
    }

    /// Locate `prop` on this level or any nested group, depth first
    pub fn find_nested(&self, prop: &str) -> Option<GridPlacement<'_>> {
        if let Some(found) = self.find_layout_by_prop(prop) {
            return Some(found);
        }
        self.rows
            .iter()
            .flatten()
            .filter_map(|item| item.group.as_deref())
            .find_map(|group| group.find_nested(prop))
    }
}

/// Stretch `row` to `max_columns` cells.
///
/// Each cell is repeated evenly to fill the extra space, any remainder is
/// padded with the empty-cell placeholder.
pub fn auto_fill_columns(row: &[String], max_columns: usize) -> Vec<String> {
    let n = row.len();
    if n >= max_columns {
        return row.to_vec();
    }
    if n == 0 {
        return vec![EMPTY_CELL.to_string(); max_columns];
    }

    let repeat = 1 + (max_columns - n) / n;
    let mut out: Vec<String> = row
        .iter()
        .flat_map(|cell| std::iter::repeat(cell.clone()).take(repeat))
        .collect();
    out.resize(max_columns, EMPTY_CELL.to_string());
    out
}

fn area_line(row: &[LayoutItem], max_columns: usize) -> String {
    let areas: Vec<String> = row.iter().map(|item| item.area.clone()).collect();
    auto_fill_columns(&areas, max_columns).join(" ")
}

fn auto_columns(count: usize) -> String {
    format!("repeat({count}, auto)")
}

fn object_of(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_auto_fill_even() {
        assert_eq!(auto_fill_columns(&strings(&["a", "b"]), 4), strings(&["a", "a", "b", "b"]));
    }

    #[test]
    fn test_auto_fill_pads() {
        assert_eq!(
            auto_fill_columns(&strings(&["a", "b"]), 5),
            strings(&["a", "a", "b", "b", "."])
        );
        assert_eq!(
            auto_fill_columns(&strings(&["a", "b", "c"]), 4),
            strings(&["a", "b", "c", "."])
        );
        assert_eq!(auto_fill_columns(&[], 2), strings(&[".", "."]));
    }

    #[test]
    fn test_auto_fill_full_row_unchanged() {
        assert_eq!(auto_fill_columns(&strings(&["a", "b"]), 2), strings(&["a", "b"]));
    }

    #[test]
    fn test_dimensions_and_templates() {
        let layout = Layout::new([vec!["name", "age", "email"], vec!["address"]]);
        assert_eq!(layout.max_columns, 3);
        assert_eq!(layout.row_count, 2);
        assert_eq!(layout.container.grid_template_columns, "repeat(3, auto)");
        assert_eq!(layout.container.grid_template_rows, "repeat(2, 1fr)");
        assert_eq!(
            layout.container.template_areas(),
            "\"name age email\" \"address address address\""
        );
    }

    #[test]
    fn test_find_layout_by_prop() {
        let layout = Layout::new([vec!["a", "b", "c", "d"], vec!["x", "y"]]);
        let y = layout.find_layout_by_prop("y").unwrap();
        assert_eq!((y.row, y.column, y.span), (1, 2, 2));
        assert_eq!(y.item.style()["gridArea"], json!("y"));
        assert!(layout.find_layout_by_prop("z").is_none());
    }

    #[test]
    fn test_nested_groups() {
        let layout = Layout::from_value(&json!([
            ["title"],
            [{
                "prop": "resources",
                "container": {"gridTemplateColumns": "1fr 2fr", "gap": "8px"},
                "group": [["cpu", "mem"]]
            }],
            [{"group": [["note"]], "item": {"marginTop": 4}}]
        ]))
        .unwrap();

        let nested = layout.rows[1][0].group.as_deref().unwrap();
        assert_eq!(nested.container.grid_template_columns, "1fr 2fr");
        assert_eq!(nested.container.extra["gap"], json!("8px"));
        assert_eq!(layout.rows[2][0].area, "group-2-0");
        assert_eq!(layout.find_nested("mem").unwrap().column, 1);
        assert_eq!(layout.find_nested("note").unwrap().row, 0);
    }

    #[test]
    fn test_invalid_rows() {
        assert_eq!(Layout::from_value(&json!([["a"], "b"])), Err(LayoutError::RowNotArray(1)));
        assert_eq!(
            Layout::from_value(&json!([["a", 3]])),
            Err(LayoutError::InvalidCell { row: 0, column: 1 })
        );
        assert_eq!(Layout::from_value(&json!({"a": 1})), Err(LayoutError::NotArray));
    }
}
