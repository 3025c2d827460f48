//! File-backed stores for the CLI: grid files (JSON 2D cell arrays) and
//! calendar files (JSON arrays of event records).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use gridcal_core::{
    Cell, ColumnMap, EventColor, EventRecord, Field, Grid, IdColumnSink, MemoryCalendar,
    SyncError, SyncResult,
};

/// A grid file on disk. The file may carry a leading binding row,
/// `["Calendar ID", "<id>"]`, which is stripped on load so the engine
/// only ever sees header + data, and re-attached on save.
pub struct GridFile {
    pub path: PathBuf,
    /// Calendar id from the binding row, if the file had one.
    pub calendar_id: Option<String>,
    pub grid: Grid,
}

/// True for a cell like "Calendar ID" / "calendar id:" in slot A1.
fn is_binding_label(cell: &Cell) -> bool {
    let stripped: String = cell
        .text()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    stripped.to_lowercase().starts_with("calendarid")
}

impl GridFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid file at {}", path.display()))?;
        let mut grid: Grid = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse grid file at {}", path.display()))?;

        let mut calendar_id = None;
        if let Some(first) = grid.rows.first() {
            if first.first().is_some_and(is_binding_label) {
                calendar_id = Some(first.get(1).map(|c| c.text()).unwrap_or_default());
                grid.rows.remove(0);
            }
        }

        Ok(GridFile {
            path: path.to_path_buf(),
            calendar_id,
            grid,
        })
    }

    pub fn save(&self) -> Result<()> {
        let mut rows = self.grid.rows.clone();
        if let Some(id) = &self.calendar_id {
            rows.insert(
                0,
                vec![
                    Cell::Text("Calendar ID".to_string()),
                    Cell::Text(id.clone()),
                ],
            );
        }
        let contents = serde_json::to_string_pretty(&Grid::new(rows))
            .context("Failed to serialize grid")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write grid file at {}", self.path.display()))?;
        Ok(())
    }
}

/// A calendar file on disk, loaded into a [`MemoryCalendar`] for the
/// run's duration and saved back afterwards.
pub struct CalendarFile {
    pub path: PathBuf,
}

impl CalendarFile {
    pub fn new(path: &Path) -> Self {
        CalendarFile {
            path: path.to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<MemoryCalendar> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read calendar file at {}", self.path.display()))?;
        let records: Vec<EventRecord> = serde_json::from_str(&contents).with_context(|| {
            format!("Failed to parse calendar file at {}", self.path.display())
        })?;
        Ok(MemoryCalendar::from_records(records))
    }

    pub fn save(&self, calendar: &MemoryCalendar) -> Result<()> {
        let contents = serde_json::to_string_pretty(&calendar.snapshot())
            .context("Failed to serialize calendar")?;
        std::fs::write(&self.path, contents).with_context(|| {
            format!("Failed to write calendar file at {}", self.path.display())
        })?;
        Ok(())
    }
}

/// Id-column checkpoint backed by the grid file itself: each flush
/// splices the ids into the file's id column and rewrites the file, so a
/// killed push leaves already-created events linked to their rows.
pub struct IdColumnWriter {
    file: GridFile,
    id_idx: usize,
}

impl IdColumnWriter {
    /// Fails when the grid has no id column; the engine validates
    /// columns before writing ids, so this is caught first anyway.
    pub fn new(file: GridFile) -> SyncResult<Self> {
        let header = file.grid.header().unwrap_or_default();
        let map = ColumnMap::build(header);
        let id_idx = map
            .position(Field::Id)
            .ok_or_else(|| SyncError::Sheet("grid has no id column".to_string()))?;
        Ok(IdColumnWriter { file, id_idx })
    }
}

impl IdColumnSink for IdColumnWriter {
    fn write_ids(&mut self, ids: &[String]) -> SyncResult<()> {
        for (row, id) in self.file.grid.rows.iter_mut().zip(ids) {
            if row.len() <= self.id_idx {
                row.resize(self.id_idx + 1, Cell::Empty);
            }
            row[self.id_idx] = if id.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(id.clone())
            };
        }
        self.file
            .save()
            .map_err(|e| SyncError::Sheet(format!("failed to checkpoint id column: {e:#}")))
    }
}

/// Presentation hints for one grid column, written next to the grid
/// file when a header is first installed. A spreadsheet frontend can
/// apply these; the CLI itself never reads them back.
#[derive(Debug, Serialize)]
struct ColumnFormat {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_format: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    checkbox: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    choices: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    hidden: bool,
}

#[derive(Debug, Serialize)]
struct SheetFormat {
    columns: Vec<ColumnFormat>,
}

const DATE_NUMBER_FORMAT: &str = "M/d/yyyy H:mm a/p";

/// Write `<grid>.format.json` describing the canonical columns: date
/// formats on the time columns, a checkbox on All Day, a dropdown of
/// palette names on Color, and a hidden Id column.
pub fn write_format_directives(grid_path: &Path) -> Result<()> {
    let columns = Field::ALL
        .iter()
        .map(|field| ColumnFormat {
            label: field.label().to_string(),
            number_format: matches!(field, Field::StartTime | Field::EndTime)
                .then(|| DATE_NUMBER_FORMAT.to_string()),
            checkbox: matches!(field, Field::AllDay),
            choices: if matches!(field, Field::Color) {
                EventColor::palette_names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect()
            } else {
                Vec::new()
            },
            hidden: matches!(field, Field::Id),
        })
        .collect();

    let path = format_path(grid_path);
    let contents = serde_json::to_string_pretty(&SheetFormat { columns })
        .context("Failed to serialize format directives")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write format file at {}", path.display()))?;
    Ok(())
}

pub fn format_path(grid_path: &Path) -> PathBuf {
    grid_path.with_extension("format.json")
}
