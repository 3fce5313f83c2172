//! Persisting resume positions between process restarts.

use crate::consumer::SeekPosition;
use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads a checkpoint. A missing file yields `Ok(None)`.
pub async fn load(path: &Path) -> Result<Option<SeekPosition>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes a checkpoint through a temporary sibling and a rename, so readers
/// never observe a half-written file.
pub async fn store(path: &Path, position: &SeekPosition) -> Result<()> {
    let json = serde_json::to_vec_pretty(position)?;
    let tmp = temp_path(path);

    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_helpers::TempLogDir;

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = TempLogDir::new().unwrap();
        let checkpoint = dir.file("position.json");
        let position = SeekPosition::new(dir.file("2024010110.log"), 4096);

        store(&checkpoint, &position).await.unwrap();
        assert_eq!(load(&checkpoint).await.unwrap(), Some(position));
        assert!(!dir.file("position.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let dir = TempLogDir::new().unwrap();
        let checkpoint = dir.file("position.json");

        store(&checkpoint, &SeekPosition::new("a.log", 1)).await.unwrap();
        store(&checkpoint, &SeekPosition::new("b.log", 2)).await.unwrap();

        assert_eq!(
            load(&checkpoint).await.unwrap(),
            Some(SeekPosition::new("b.log", 2))
        );
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = TempLogDir::new().unwrap();
        assert_eq!(load(&dir.file("absent.json")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_corrupt_is_error() {
        let dir = TempLogDir::new().unwrap();
        let checkpoint = dir.create("position.json", "{\"path\":").unwrap();

        assert!(matches!(
            load(&checkpoint).await,
            Err(Error::Checkpoint(_))
        ));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path(Path::new("/var/lib/follower/pos.json")),
            PathBuf::from("/var/lib/follower/pos.json.tmp")
        );
    }
}
