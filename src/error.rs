//! Error types.
//!
//! - `AppError` is the application boundary error: a message plus the process
//!   exit code `main` should use.
//! - `LoadError` covers everything that can abort a dataset load.
//! - `ItemNotFound` is the normal "no such item" outcome of a lookup.

use std::path::PathBuf;

use crate::io::ingest::RowError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a dataset load failed.
///
/// Any of these aborts the load: no snapshot is built from a partial read.
#[derive(Debug)]
pub enum LoadError {
    /// The input could not be opened or read.
    Io { path: Option<PathBuf>, source: std::io::Error },
    /// The header row could not be read at all.
    Header(String),
    /// Required columns are absent after header trimming.
    Schema { missing: Vec<&'static str> },
    /// A row failed to parse under the strict policy.
    RecordParse(RowError),
    /// Every data row was rejected (or there were none).
    NoValidRows { rows_read: usize },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path: Some(path), source } => {
                write!(f, "Failed to read sales data '{}': {source}", path.display())
            }
            LoadError::Io { path: None, source } => write!(f, "Failed to read sales data: {source}"),
            LoadError::Header(msg) => write!(f, "Failed to read header row: {msg}"),
            LoadError::Schema { missing } => {
                let cols: Vec<String> = missing.iter().map(|c| format!("`{c}`")).collect();
                write!(f, "Missing required column(s): {}", cols.join(", "))
            }
            LoadError::RecordParse(row) => write!(f, "Line {}: {}", row.line, row.message),
            LoadError::NoValidRows { rows_read } => {
                write!(f, "No valid rows in sales data ({rows_read} row(s) read).")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        let code = match err {
            LoadError::NoValidRows { .. } => 3,
            _ => 2,
        };
        AppError::new(code, err.to_string())
    }
}

/// The queried item has no rows in the loaded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemNotFound {
    pub item_name: String,
}

impl std::fmt::Display for ItemNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item '{}' not found in data.", self.item_name)
    }
}

impl std::error::Error for ItemNotFound {}

impl From<ItemNotFound> for AppError {
    fn from(err: ItemNotFound) -> Self {
        AppError::new(1, err.to_string())
    }
}
