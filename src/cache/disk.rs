//! On-disk persistence for cached results.
//!
//! One JSON file per key, named by the SHA-256 of the key. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! reader never sees a partial entry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A persisted entry. The full key is stored to detect hash collisions and
/// misplaced files.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Persisted<T> {
    pub key: String,
    pub expires_at_ms: u64,
    pub value: T,
}

/// Result of reading one persisted file.
pub(crate) enum DiskRead<T> {
    Missing,
    Corrupt(String),
    Found(Persisted<T>),
}

pub(crate) struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn open(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> DiskRead<T> {
        let path = self.path_for(key);
        match read_file::<T>(&path) {
            DiskRead::Found(entry) if entry.key != key => {
                DiskRead::Corrupt(format!("{} holds key {}", path.display(), entry.key))
            }
            other => other,
        }
    }

    pub fn write<T: Serialize>(&self, entry: &Persisted<T>) -> io::Result<()> {
        let path = self.path_for(&entry.key);
        let content = serde_json::to_vec(entry).map_err(io::Error::other)?;
        let tmp = path.with_extension(format!("json.tmp{}", std::process::id()));
        fs::write(&tmp, content)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        remove_if_present(&self.path_for(key))
    }

    /// Every entry file in the directory.
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Read and check one entry file, verifying its name matches its key.
pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> DiskRead<T> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return DiskRead::Missing,
        Err(err) => return DiskRead::Corrupt(format!("{}: {}", path.display(), err)),
    };
    let entry: Persisted<T> = match serde_json::from_slice(&content) {
        Ok(entry) => entry,
        Err(err) => return DiskRead::Corrupt(format!("{}: {}", path.display(), err)),
    };
    let expected = format!("{}.json", hex::encode(Sha256::digest(entry.key.as_bytes())));
    if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
        return DiskRead::Corrupt(format!("{} does not match its key", path.display()));
    }
    DiskRead::Found(entry)
}

pub(crate) fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
