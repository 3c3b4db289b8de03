//! Durable copy of every downloaded page, one JSON record per file.
//!
//! The frontier's in-memory sets are only a cache of what is in here; they are
//! rebuilt from [`PageStore::load_all`] at startup.

use crate::error::StoreError;
use crate::model::RawPage;
use log::warn;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A persisted page together with the key it is stored under.
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub key: String,
    pub page: RawPage,
}

pub trait PageStore: Send {
    /// Read every record. Unreadable records are skipped with a warning.
    fn load_all(&self) -> Result<Vec<StoredPage>, StoreError>;

    /// Write `page` in full, replacing any record for the same URL, and return
    /// its storage key.
    fn save(&mut self, page: &RawPage) -> Result<String, StoreError>;
}

/// Page store backed by a directory (`<root>/<source>/`).
#[derive(Debug, Clone)]
pub struct FsPageStore {
    dir: PathBuf,
}

impl FsPageStore {
    pub fn open(root: impl AsRef<Path>, source: &str) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(source);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Longest file stem we produce; leaves room for `.json`/`.tmp` under the
/// usual 255-byte file name limit.
const MAX_KEY_STEM: usize = 200;
const DIGEST_CHARS: usize = 16;

/// File name for a normalized URL. Every byte outside `[A-Za-z0-9.-]` is
/// percent-encoded, so distinct URLs never share a file. Stems longer than
/// [`MAX_KEY_STEM`] are cut and suffixed with part of the URL's SHA-256.
pub fn storage_key(url: &str) -> String {
    let mut key = String::with_capacity(url.len() + 8);
    for b in url.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' {
            key.push(b as char);
        } else {
            key.push_str(&format!("%{b:02X}"));
        }
    }
    if key.len() > MAX_KEY_STEM {
        // the stem is ASCII, any byte index is a char boundary
        key.truncate(MAX_KEY_STEM - DIGEST_CHARS - 1);
        let digest = Sha256::digest(url.as_bytes());
        key.push('-');
        for b in &digest[..DIGEST_CHARS / 2] {
            key.push_str(&format!("{b:02x}"));
        }
    }
    key.push_str(".json");
    key
}

impl PageStore for FsPageStore {
    fn load_all(&self) -> Result<Vec<StoredPage>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();

        let mut pages = Vec::with_capacity(files.len());
        for path in files {
            match read_record(&path) {
                Ok(page) => {
                    let key = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    pages.push(StoredPage { key, page });
                }
                Err(e) => warn!("Failed to deserialize the contents of {}: {}", path.display(), e),
            }
        }
        Ok(pages)
    }

    fn save(&mut self, page: &RawPage) -> Result<String, StoreError> {
        let key = storage_key(&page.url);
        let path = self.dir.join(&key);
        let json = serde_json::to_string_pretty(page).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        // write aside and rename so a record is never visible half-written
        let tmp = self.dir.join(format!("{key}.tmp"));
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(key)
    }
}

fn read_record(path: &Path) -> Result<RawPage, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
