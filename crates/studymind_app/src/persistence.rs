use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use studymind_core::{StudySettings, DEFAULT_MARKS};
use studymind_logging::sm_info;

const SETTINGS_FILENAME: &str = "settings.ron";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to create data directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default)]
    syllabus_text: String,
    #[serde(default = "default_marks")]
    marks: u32,
    #[serde(default)]
    study_mode: bool,
}

fn default_marks() -> u32 {
    DEFAULT_MARKS
}

impl From<&StudySettings> for PersistedSettings {
    fn from(settings: &StudySettings) -> Self {
        Self {
            syllabus_text: settings.syllabus_text.clone(),
            marks: settings.marks,
            study_mode: settings.study_mode,
        }
    }
}

impl From<PersistedSettings> for StudySettings {
    fn from(persisted: PersistedSettings) -> Self {
        Self {
            syllabus_text: persisted.syllabus_text,
            marks: persisted.marks,
            study_mode: persisted.study_mode,
        }
    }
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILENAME)
}

/// Loads settings saved by a previous run. `Ok(None)` when nothing was saved yet.
pub(crate) fn load_settings(data_dir: &Path) -> Result<Option<StudySettings>, PersistError> {
    let path = settings_path(data_dir);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PersistError::Read { path, source }),
    };
    let persisted: PersistedSettings =
        ron::from_str(&content).map_err(|source| PersistError::Parse {
            path: path.clone(),
            source,
        })?;
    sm_info!("Loaded study settings from {:?}", path);
    Ok(Some(persisted.into()))
}

/// Writes settings through a temp file in the same directory, then renames it into place.
pub(crate) fn save_settings(data_dir: &Path, settings: &StudySettings) -> Result<(), PersistError> {
    fs::create_dir_all(data_dir).map_err(|source| PersistError::CreateDir {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&PersistedSettings::from(settings), pretty)?;

    let path = settings_path(data_dir);
    let write_err = |source| PersistError::Write {
        path: path.clone(),
        source,
    };
    let mut temp = tempfile::NamedTempFile::new_in(data_dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(&path).map_err(|err| write_err(err.error))?;
    Ok(())
}
