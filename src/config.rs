//! Persisted configuration records and the store they live in.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    Album,
    Runtime,
    App,
}

impl ConfigKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigKind::Album => "album.json",
            ConfigKind::Runtime => "runtime.json",
            ConfigKind::App => "app.json",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigKind::Album => "album",
            ConfigKind::Runtime => "runtime",
            ConfigKind::App => "app",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ConfigKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "album" => Ok(ConfigKind::Album),
            "runtime" => Ok(ConfigKind::Runtime),
            "app" => Ok(ConfigKind::App),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown settings kind: {other}"
            ))),
        }
    }
}

/// Rotation state that survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    #[serde(deserialize_with = "one_or_many")]
    pub current_album: Vec<String>,

    #[serde(deserialize_with = "one_or_many")]
    pub current_night_mode_album: Vec<String>,

    /// Front is the next wallpaper to show.
    pub current_queue: VecDeque<String>,

    pub current_random: bool,

    /// Minutes between wallpaper changes
    pub current_shuffle_interval: u64,

    pub current_night_mode: bool,
    pub current_night_mode_start: String,
    pub current_night_mode_end: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            current_album: Vec::new(),
            current_night_mode_album: Vec::new(),
            current_queue: VecDeque::new(),
            current_random: true,
            current_shuffle_interval: 30,
            current_night_mode: false,
            current_night_mode_start: "22:00".to_string(),
            current_night_mode_end: "06:00".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Shuffle interval in seconds, never zero.
    pub fn shuffle_interval_secs(&self) -> u64 {
        self.current_shuffle_interval.max(1) * 60
    }
}

/// Older files stored a single album name instead of a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) if name.is_empty() => Vec::new(),
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub rescan_every_start: bool,
    pub auto_rescan: bool,

    /// Hours between automatic rescans
    pub rescan_interval: u64,

    /// Descend into subfolders of an album's base folder when syncing.
    pub scan_subfolders: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            rescan_every_start: false,
            auto_rescan: false,
            rescan_interval: 24,
            scan_subfolders: false,
        }
    }
}

/// Raw storage for the three configuration documents.
pub trait ConfigStore: Send {
    /// Returns `None` when nothing has been saved yet.
    fn read(&self, kind: ConfigKind) -> Result<Option<String>>;
    fn write(&self, kind: ConfigKind, contents: &str) -> Result<()>;
}

pub fn load<T>(store: &dyn ConfigStore, kind: ConfigKind) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.read(kind)? {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(&text).map_err(|e| Error::config_io(kind, e))
        }
        _ => {
            log::info!("no {} config yet, using defaults", kind);
            Ok(T::default())
        }
    }
}

pub fn save<T: Serialize>(store: &dyn ConfigStore, kind: ConfigKind, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| Error::config_io(kind, e))?;
    store.write(kind, &text)
}

/// One JSON file per kind inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, kind: ConfigKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid path"))?;
    std::fs::create_dir_all(dir)?;

    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("album-wallpaper")
    ));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

impl ConfigStore for JsonFileStore {
    fn read(&self, kind: ConfigKind) -> Result<Option<String>> {
        let path = self.path(kind);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::config_io(
                kind,
                format!("read {}: {}", path.display(), e),
            )),
        }
    }

    fn write(&self, kind: ConfigKind, contents: &str) -> Result<()> {
        let path = self.path(kind);
        atomic_write(&path, contents.as_bytes())
            .map_err(|e| Error::config_io(kind, format!("write {}: {}", path.display(), e)))
    }
}
