use anyhow::Result;
use bytes::Bytes;
use uuid::Uuid;

use crate::infra::storage::FileStorage;

/// An image picked by the user, as handed to the upload flow.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_id: String,
    pub view_url: String,
}

#[derive(Clone)]
pub struct MediaService {
    storage: FileStorage,
}

impl MediaService {
    pub fn new(storage: FileStorage) -> Self {
        Self { storage }
    }

    /// Uploads under a client-generated id and returns the id together
    /// with the public view URL that gets embedded into documents.
    pub async fn upload_image(&self, source: UploadSource) -> Result<UploadedImage> {
        let file_id = Uuid::new_v4().to_string();
        let stored = self
            .storage
            .upload(&file_id, &source.filename, &source.content_type, source.bytes)
            .await?;
        Ok(UploadedImage {
            view_url: self.storage.view_url(&stored.id),
            file_id: stored.id,
        })
    }

    pub async fn delete_image(&self, file_id: &str) -> Result<()> {
        self.storage.delete(file_id).await?;
        Ok(())
    }
}
