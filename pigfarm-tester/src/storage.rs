use pigfarm_game::{CatalogError, CatalogLoader, FarmStorage, GameCatalog};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("failed to create save directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Snapshots stored as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FileStorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| FileStorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl FarmStorage for FileStorage {
    type Error = FileStorageError;

    fn write_snapshot(&self, key: &str, snapshot: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        fs::write(&path, snapshot).map_err(|source| FileStorageError::Write { path, source })
    }

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStorageError::Read { path, source }),
        }
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStorageError::Delete { path, source }),
        }
    }
}

#[derive(Debug, Error)]
#[error("in-memory storage lock poisoned")]
pub struct MemoryStorageError;

/// Process-local storage used when no save directory is given.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Arc<Mutex<HashMap<String, String>>>,
}

impl FarmStorage for MemoryStorage {
    type Error = MemoryStorageError;

    fn write_snapshot(&self, key: &str, snapshot: &str) -> Result<(), Self::Error> {
        let mut saves = self.saves.lock().map_err(|_| MemoryStorageError)?;
        saves.insert(key.to_string(), snapshot.to_string());
        Ok(())
    }

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let saves = self.saves.lock().map_err(|_| MemoryStorageError)?;
        Ok(saves.get(key).cloned())
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        let mut saves = self.saves.lock().map_err(|_| MemoryStorageError)?;
        saves.remove(key);
        Ok(())
    }
}

/// Either save backend, picked at startup from `--save-dir`.
#[derive(Debug, Clone)]
pub enum HostStorage {
    File(FileStorage),
    Memory(MemoryStorage),
}

#[derive(Debug, Error)]
pub enum HostStorageError {
    #[error(transparent)]
    File(#[from] FileStorageError),
    #[error(transparent)]
    Memory(#[from] MemoryStorageError),
}

impl HostStorage {
    pub fn from_dir(dir: Option<&Path>) -> Result<Self, FileStorageError> {
        match dir {
            Some(dir) => FileStorage::new(dir).map(Self::File),
            None => Ok(Self::Memory(MemoryStorage::default())),
        }
    }
}

impl FarmStorage for HostStorage {
    type Error = HostStorageError;

    fn write_snapshot(&self, key: &str, snapshot: &str) -> Result<(), Self::Error> {
        match self {
            Self::File(s) => Ok(s.write_snapshot(key, snapshot)?),
            Self::Memory(s) => Ok(s.write_snapshot(key, snapshot)?),
        }
    }

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match self {
            Self::File(s) => Ok(s.read_snapshot(key)?),
            Self::Memory(s) => Ok(s.read_snapshot(key)?),
        }
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        match self {
            Self::File(s) => Ok(s.delete_snapshot(key)?),
            Self::Memory(s) => Ok(s.delete_snapshot(key)?),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

/// Catalog from `--catalog`, or the embedded one.
#[derive(Debug, Clone, Default)]
pub struct HostCatalog {
    path: Option<PathBuf>,
}

impl HostCatalog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl CatalogLoader for HostCatalog {
    type Error = CatalogFileError;

    fn load_catalog(&self) -> Result<Arc<GameCatalog>, Self::Error> {
        let Some(path) = &self.path else {
            return GameCatalog::shared_static().map_err(|source| CatalogFileError::Invalid {
                path: PathBuf::from("<embedded>"),
                source,
            });
        };
        let text = fs::read_to_string(path).map_err(|source| CatalogFileError::Io {
            path: path.clone(),
            source,
        })?;
        GameCatalog::from_json(&text)
            .map(Arc::new)
            .map_err(|source| CatalogFileError::Invalid {
                path: path.clone(),
                source,
            })
    }
}
