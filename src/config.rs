use crate::persistence::{DynStore, FileStore, MemoryStore, PersistenceResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Key the browser build stores its snapshot under.
pub const DEFAULT_STORAGE_KEY: &str = "ganttData";

/// Environment variable naming a JSON config file for the binaries.
pub const CONFIG_ENV_VAR: &str = "GANTT_STORE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File { dir: PathBuf },
    #[cfg(feature = "sqlite")]
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::File {
        dir: PathBuf::from("gantt-data"),
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            backend: default_backend(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            storage_key: default_storage_key(),
            backend: StorageBackend::Memory,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Reads the file named by `GANTT_STORE_CONFIG`, or the defaults when unset.
    pub fn from_env() -> PersistenceResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn open_storage(&self) -> PersistenceResult<DynStore> {
        Ok(match &self.backend {
            StorageBackend::Memory => Box::new(MemoryStore::new()),
            StorageBackend::File { dir } => Box::new(FileStore::new(dir)?),
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite { path } => {
                Box::new(crate::persistence::SqliteStore::new(path)?)
            }
        })
    }
}
