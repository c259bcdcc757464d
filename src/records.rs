use tracing::{debug, error};

use crate::sheets::RecordSource;

/// Raw cell values as returned by the data source. Row 0 is the header.
/// Rows keep their original length so a missing cell stays distinguishable
/// from an empty one.
pub type RecordGrid = Vec<Vec<String>>;

/// Header fragments that mark the identifier column, checked in order
/// against the lowercased header name.
const ID_HEADER_HINTS: [&str; 3] = ["admission", "adm", "roll"];

/// One row of the sheet keyed by header name, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first field in header order.
    pub fn first_value(&self) -> Option<&str> {
        self.fields.first().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A grid that has been checked to hold a header and at least one data row.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    id_column: usize,
}

impl RecordTable {
    /// Returns `None` when the grid has no data rows beneath the header.
    pub fn from_grid(mut grid: RecordGrid) -> Option<Self> {
        if grid.len() < 2 {
            return None;
        }
        let rows = grid.split_off(1);
        let headers = grid.pop()?;
        let id_column = identifier_column(&headers);
        Some(Self {
            headers,
            rows,
            id_column,
        })
    }

    /// First data row whose identifier cell equals `key` exactly.
    pub fn find(&self, key: &str) -> Option<Record> {
        self.rows
            .iter()
            .find(|row| row.get(self.id_column).is_some_and(|cell| cell == key))
            .map(|row| self.to_record(row))
    }

    fn to_record(&self, row: &[String]) -> Record {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), row.get(i).map(String::as_str).unwrap_or("")))
            .collect()
    }
}

/// Index of the first header containing one of the identifier hints
/// (case-insensitive), or column 0 when none does.
pub fn identifier_column(headers: &[String]) -> usize {
    headers
        .iter()
        .position(|h| {
            let lower = h.to_lowercase();
            ID_HEADER_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .unwrap_or(0)
}

/// Look `key` up in an already fetched grid.
pub fn lookup(grid: RecordGrid, key: &str) -> Option<Record> {
    RecordTable::from_grid(grid)?.find(key)
}

/// Fetch a fresh grid from `source` and look `key` up in it.
///
/// Fetch and decode failures are logged and reported as "no record".
pub async fn find_record(source: &dyn RecordSource, key: &str) -> Option<Record> {
    let grid = match source.fetch_grid().await {
        Ok(grid) => grid,
        Err(e) => {
            error!("Record source error: {:#}", e);
            return None;
        }
    };

    debug!("Fetched {} row(s) from record source", grid.len());
    lookup(grid, key)
}
