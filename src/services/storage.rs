use std::io;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::config::Settings;

/// Written in place of an upload when a question expires unanswered.
pub(crate) const AUTO_SUBMIT_PLACEHOLDER: &[u8] = b"# auto-submitted empty file\n";

#[derive(Debug, Clone)]
pub(crate) struct StoredArtifact {
    pub(crate) size: i64,
    pub(crate) sha256_hex: String,
}

/// Filesystem store for answer artifacts, one canonical file per
/// (student, question): `<root>/<username>/<question>.<ext>`. Files only ever
/// appear via an atomic rename, so readers never see a partial write.
#[derive(Debug, Clone)]
pub(crate) struct SubmissionStore {
    root: PathBuf,
    extension: String,
}

impl SubmissionStore {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            root: PathBuf::from(&settings.exam().submissions_dir),
            extension: settings.storage().artifact_extension().to_string(),
        }
    }

    pub(crate) async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub(crate) fn artifact_extension(&self) -> &str {
        &self.extension
    }

    fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(username)
    }

    fn artifact_path(&self, username: &str, question: &str) -> PathBuf {
        self.user_dir(username).join(format!("{question}.{}", self.extension))
    }

    pub(crate) async fn store(
        &self,
        username: &str,
        question: &str,
        bytes: &[u8],
    ) -> io::Result<StoredArtifact> {
        let user_dir = self.user_dir(username);
        tokio::fs::create_dir_all(&user_dir).await?;

        let size = bytes.len() as i64;
        let sha256_hex = hex::encode(Sha256::digest(bytes));

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let temp_path = user_dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let dest = self.artifact_path(username, question);

        tokio::fs::write(&temp_path, bytes).await?;
        if let Err(err) = tokio::fs::rename(&temp_path, &dest).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(err);
        }

        Ok(StoredArtifact { size, sha256_hex })
    }

    pub(crate) async fn exists(&self, username: &str, question: &str) -> bool {
        tokio::fs::try_exists(self.artifact_path(username, question)).await.unwrap_or(false)
    }

    pub(crate) async fn read(
        &self,
        username: &str,
        question: &str,
    ) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.artifact_path(username, question)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Removes every stored artifact and recreates the empty root.
    pub(crate) async fn reset(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        tokio::fs::create_dir_all(&self.root).await
    }

    #[cfg(test)]
    pub(crate) fn with_root(root: &std::path::Path, extension: &str) -> Self {
        Self { root: root.to_path_buf(), extension: extension.to_string() }
    }
}
