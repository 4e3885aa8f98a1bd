use crate::domain::ports::Storage;
use crate::utils::error::{HarvestError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 本機檔案系統儲存，所有路徑相對於 `base_path`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> HarvestError {
    HarvestError::Storage {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        tokio::fs::read(&full_path)
            .await
            .map_err(|e| storage_error(&full_path, e))
    }

    /// 先寫暫存檔再 rename，讀者不會看到寫到一半的檔案
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        let mut tmp_name = full_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &full_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(storage_error(&full_path, e));
        }

        Ok(())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let full_path = self.full_path(path);
        let mut entries = match tokio::fs::read_dir(&full_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error(&full_path, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(&full_path, e))?
        {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn remove_dir(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        match tokio::fs::remove_dir_all(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&full_path, e)),
        }
    }
}
