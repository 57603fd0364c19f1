//! Whole-file JSON array documents.
//!
//! Writes go to a sibling temporary file that is synced and then renamed over
//! the target, so a crash mid-write leaves the previous contents intact.

use crate::catalog::errors::HarvestError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Read a JSON array from `path`. A missing file is an empty document.
pub async fn load_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, HarvestError> {
    let body = match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(HarvestError::persistence(path, e)),
    };
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    parse_with_context(&body).map_err(|e| HarvestError::persistence(path, e))
}

/// Replace the document at `path` with `items`.
pub async fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), HarvestError> {
    let bytes = serde_json::to_vec_pretty(items).map_err(|e| HarvestError::persistence(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HarvestError::persistence(parent, e))?;
    }

    let tmp = temp_path(path);
    let write = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await
    };
    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(HarvestError::persistence(path, e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Deserialize, reporting the JSON path of the offending element on failure
/// (`[12].capacity: invalid type: string "x", expected u32 at line 40 column 22`).
fn parse_with_context<T: DeserializeOwned>(body: &str) -> anyhow::Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path.is_empty() || path == "." {
            anyhow::anyhow!("{inner}")
        } else {
            anyhow::anyhow!("{path}: {inner}")
        }
    })
}
