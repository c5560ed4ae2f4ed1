use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;

use crate::infra::http::{BackendError, Connection};

#[derive(Clone)]
pub struct FileStorage {
    conn: Connection,
    bucket_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredFile {
    pub id: String,
}

impl FileStorage {
    pub fn new(conn: Connection, bucket_id: String) -> Self {
        Self { conn, bucket_id }
    }

    fn files_path(&self) -> String {
        format!("/v1/storage/buckets/{}/files", self.bucket_id)
    }

    pub async fn upload(
        &self,
        file_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredFile, BackendError> {
        let builder = self
            .conn
            .request(Method::POST, &self.files_path())
            .query(&[("file_id", file_id), ("filename", filename)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.conn.recv_json(builder).await
    }

    /// Public view URL for an uploaded file, embedded into documents.
    pub fn view_url(&self, file_id: &str) -> String {
        self.conn
            .url_for(&format!("{}/{}/view", self.files_path(), file_id))
            .to_string()
    }

    pub async fn delete(&self, file_id: &str) -> Result<(), BackendError> {
        let builder = self
            .conn
            .request(Method::DELETE, &format!("{}/{}", self.files_path(), file_id));
        self.conn.recv_unit(builder).await
    }
}
