use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use epub_paging::{PagingSession, PagingSurface, ReadingPosition, ScrollRequester};
use serde::{Deserialize, Serialize};

const POSITIONS_VERSION: u8 = 1;
const DEFAULT_MAX_ENTRIES: usize = 256;

/// Failure reading or writing the positions file.
#[derive(Debug)]
pub enum PositionsError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl core::fmt::Display for PositionsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "positions file I/O error: {}", err),
            Self::Json(err) => write!(f, "positions file is not valid JSON: {}", err),
        }
    }
}

impl std::error::Error for PositionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for PositionsError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PositionsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Serialize, Deserialize)]
struct PositionsFile {
    version: u8,
    positions: Vec<ReadingPosition>,
}

/// Last reading position per document, most recently read first.
///
/// Backed by a single JSON file when created with a path; ephemeral otherwise.
/// Only the newest `max_entries` documents are kept.
#[derive(Debug)]
pub struct ReadingPositions {
    positions: Vec<ReadingPosition>,
    file_path: Option<PathBuf>,
    max_entries: usize,
}

impl ReadingPositions {
    pub fn ephemeral() -> Self {
        Self {
            positions: Vec::new(),
            file_path: None,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_file(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            ..Self::ephemeral()
        }
    }

    /// Cap the number of remembered documents (`0` is treated as `1`).
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self.positions.truncate(self.max_entries);
        self
    }

    /// Load `file_path`; a missing file yields an empty, file-backed set.
    ///
    /// Files written by another format version are ignored.
    pub fn load_from_file(file_path: impl Into<PathBuf>) -> Result<Self, PositionsError> {
        let mut loaded = Self::with_file(file_path);
        let Some(path) = loaded.file_path.as_deref() else {
            return Ok(loaded);
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(loaded),
            Err(err) => return Err(err.into()),
        };
        let file: PositionsFile = serde_json::from_slice(&bytes)?;
        if file.version != POSITIONS_VERSION {
            log::warn!(
                "ignoring positions file {} with version {}",
                path.display(),
                file.version
            );
            return Ok(loaded);
        }
        loaded.positions = file.positions;
        loaded.positions.truncate(loaded.max_entries);
        Ok(loaded)
    }

    /// Load `file_path` if given, falling back to an empty set on errors.
    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|err| {
                log::warn!("failed to load positions from {}: {}", path.display(), err);
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn get(&self, document_key: &str) -> Option<&ReadingPosition> {
        self.positions
            .iter()
            .find(|position| position.document_key == document_key)
    }

    pub fn most_recent(&self) -> Option<&ReadingPosition> {
        self.positions.first()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Remember `position` as the most recent one and persist.
    pub fn record(&mut self, position: ReadingPosition) {
        self.positions
            .retain(|existing| existing.document_key != position.document_key);
        self.positions.insert(0, position);
        self.positions.truncate(self.max_entries);
        if let Err(err) = self.save() {
            log::warn!("failed to save reading positions: {}", err);
        }
    }

    /// Remember the session's current position, once it has a layout.
    pub fn record_session<S, R>(&mut self, session: &PagingSession<S, R>) -> bool
    where
        S: PagingSurface,
        R: ScrollRequester,
    {
        match session.reading_position() {
            Some(position) => {
                self.record(position);
                true
            }
            None => false,
        }
    }

    /// Hand the stored position for the session's document to the session.
    pub fn restore_session<S, R>(&self, session: &mut PagingSession<S, R>) -> bool
    where
        S: PagingSurface,
        R: ScrollRequester,
    {
        let Some(position) = session.document_key().and_then(|key| self.get(key)) else {
            return false;
        };
        session.restore_position(position)
    }

    /// Write the file through a sibling temp file so readers never see a
    /// partial write. Ephemeral sets do nothing.
    pub fn save(&self) -> Result<(), PositionsError> {
        let Some(path) = self.file_path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = PositionsFile {
            version: POSITIONS_VERSION,
            positions: self.positions.clone(),
        };
        let staged = path.with_extension("json.partial");
        fs::write(&staged, serde_json::to_vec_pretty(&file)?)?;
        if let Err(err) = fs::rename(&staged, path) {
            let _ = fs::remove_file(&staged);
            return Err(err.into());
        }
        Ok(())
    }
}
