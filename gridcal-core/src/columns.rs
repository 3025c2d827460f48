//! Header-row column mapping.
//!
//! A grid binds columns to event fields purely by header label. The
//! mapping is positional: slot `i` names the field column `i` feeds, or
//! `None` for columns the engine does not know about (extra columns are
//! allowed and left untouched).

use crate::cell::Cell;

/// Canonical event field keys, in canonical (header synthesis) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Location,
    StartTime,
    EndTime,
    Guests,
    Color,
    AllDay,
    Id,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Title,
        Field::Description,
        Field::Location,
        Field::StartTime,
        Field::EndTime,
        Field::Guests,
        Field::Color,
        Field::AllDay,
        Field::Id,
    ];

    /// The display label used in a grid header row.
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Location => "Location",
            Field::StartTime => "Start Time",
            Field::EndTime => "End Time",
            Field::Guests => "Guests",
            Field::Color => "Color",
            Field::AllDay => "All Day",
            Field::Id => "Id",
        }
    }
}

/// Positional header→field correspondence for one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    slots: Vec<Option<Field>>,
}

impl ColumnMap {
    /// Build a mapping from a header row. Each cell's text is matched
    /// against the canonical labels; the first matching field in
    /// canonical order wins, unknown labels map to `None`.
    pub fn build(header: &[Cell]) -> Self {
        let slots = header
            .iter()
            .map(|cell| {
                let text = cell.text();
                let text = text.trim().to_string();
                Field::ALL.into_iter().find(|f| f.label() == text)
            })
            .collect();
        ColumnMap { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Field>] {
        &self.slots
    }

    /// Position of the first column bound to `field`, if any.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(field))
    }

    /// Required fields absent from this mapping. `Id`, `Title`,
    /// `StartTime` and `EndTime` are always required; `AllDay` only when
    /// the all-day policy reads it from a column.
    pub fn required_missing(&self, require_all_day_column: bool) -> Vec<Field> {
        let mut required = vec![Field::Id, Field::Title, Field::StartTime, Field::EndTime];
        if require_all_day_column {
            required.push(Field::AllDay);
        }
        required
            .into_iter()
            .filter(|f| self.position(*f).is_none())
            .collect()
    }

    /// All canonical fields with no column in this mapping. Used to seed
    /// defaults for grids created before a schema extension added a
    /// column (e.g. an old grid with no Guests column).
    pub fn all_missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.position(*f).is_none())
            .collect()
    }
}

/// Quoted, comma-separated display labels, for error reporting.
pub fn field_labels(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f.label()))
        .collect::<Vec<_>>()
        .join(", ")
}
