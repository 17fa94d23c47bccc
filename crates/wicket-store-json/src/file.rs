//! Whole-file reads and atomic whole-file writes.

use std::{io::ErrorKind, path::Path};

use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{Error, Result};

/// Read `path`, or `None` if it does not exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
  match fs::read(path).await {
    Ok(bytes) => Ok(Some(bytes)),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
    Err(e) => Err(Error::io(path)(e)),
  }
}

/// Replace `path` with `bytes`. The new content is written and synced to a
/// sibling temporary file first, then renamed into place.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
  let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  fs::create_dir_all(dir).await.map_err(Error::io(dir))?;

  let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  let tmp = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

  let written = async {
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    fs::rename(&tmp, path).await
  }
  .await;

  if let Err(e) = written {
    // Best effort.
    let _ = fs::remove_file(&tmp).await;
    return Err(Error::io(path)(e));
  }
  Ok(())
}

/// The version token of a stored document: hex SHA-256 of its bytes.
pub fn content_version(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }
