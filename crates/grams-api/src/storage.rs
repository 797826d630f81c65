use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// On-disk picture storage.
///
/// Each picture is a single flat file at `{dir}/{picture_id}`. Ids are
/// UUIDs, so a stored name can never escape the directory.
pub struct PictureStore {
    dir: PathBuf,
}

impl PictureStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Picture storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, picture_id: &Uuid) -> PathBuf {
        self.dir.join(picture_id.to_string())
    }

    /// Write the picture to disk. Returns its hex SHA-256.
    pub async fn save(&self, picture_id: &Uuid, data: &[u8]) -> Result<String> {
        let path = self.file_path(picture_id);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        let mut hasher = Sha256::new();
        hasher.update(data);
        Ok(hex::encode(hasher.finalize()))
    }

    pub async fn read(&self, picture_id: &Uuid) -> Result<Vec<u8>> {
        Ok(fs::read(self.file_path(picture_id)).await?)
    }

    pub async fn delete(&self, picture_id: &Uuid) -> Result<()> {
        let path = self.file_path(picture_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted picture {}", picture_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Picture {} already gone", picture_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures")).await.unwrap();
        let id = Uuid::new_v4();

        let sha = store.save(&id, b"not really a png").await.unwrap();
        assert_eq!(sha.len(), 64);
        assert_eq!(store.read(&id).await.unwrap(), b"not really a png");

        store.delete(&id).await.unwrap();
        assert!(store.read(&id).await.is_err());
        // Deleting twice is not an error
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn checksum_is_sha256_of_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().to_path_buf()).await.unwrap();
        let sha = store.save(&Uuid::new_v4(), b"abc").await.unwrap();
        assert_eq!(
            sha,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
