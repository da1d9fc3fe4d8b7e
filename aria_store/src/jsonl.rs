//! Line-delimited JSON files and atomic whole-file writes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Append one record as a JSON line, creating the file and its directory.
pub async fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    ensure_parent(path).await?;
    let line = serde_json::to_string(record)? + "\n";

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.flush().await.map_err(|e| StoreError::io(path, e))?;

    debug!(?path, "Appended record");
    Ok(())
}

/// Read every well-formed line. Malformed lines are logged and skipped.
pub async fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let Some(content) = read_optional(path).await? else {
        return Ok(Vec::new());
    };

    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(?path, line = n + 1, "Skipping malformed record: {e}");
                None
            }
        })
        .collect())
}

/// File contents, or `None` when the file does not exist yet.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Replace `path` through a sibling temp file so readers never see a torn write.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Row {
        n: u32,
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let temp = tempdir().unwrap();
        let rows: Vec<Row> = read_all(&temp.path().join("none.jsonl")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("rows.jsonl");
        append(&path, &Row { n: 1 }).await.unwrap();
        tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .unwrap()
            .write_all(b"{not json\n\n")
            .await
            .unwrap();
        append(&path, &Row { n: 2 }).await.unwrap();

        let rows: Vec<Row> = read_all(&path).await.unwrap();
        assert_eq!(rows, [Row { n: 1 }, Row { n: 2 }]);
    }

    #[tokio::test]
    async fn atomic_write_replaces_content() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("doc.json");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some("second"));
        assert!(!path.with_extension("tmp").exists());
    }
}
