use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised before a record is created. No state changes when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("{field} is required")]
    MissingSelection { field: &'static str },

    #[error(
        "not enough '{material}' in stock: requested {requested} kg, available {available:.2} kg"
    )]
    InsufficientStock {
        material: String,
        requested: f64,
        available: f64,
    },

    #[error("purchases are paid on the spot; only sales can be deferred")]
    DeferredPurchase,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: invalid store data: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("data directory {0} is currently in use by another operation")]
    Locked(PathBuf),

    #[error("no data directory: pass --data or set ECORECYCLE_DATA")]
    NoDataDir,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown theme color '{0}'")]
    UnknownColor(String),

    #[error("unknown font '{0}'")]
    UnknownFont(String),

    #[error("unknown language '{0}', expected ru or tj")]
    UnknownLang(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not logged in; run `ecorecycle login` first")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Export failures are reported to the user and never touch the store.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "the built-in PDF font cannot show '{sample}'; configure a TrueType font with `ecorecycle settings pdf-font <PATH>`"
    )]
    FontRequired { sample: char },

    #[error("font {path} unavailable: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("docx packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("csv rendering failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
