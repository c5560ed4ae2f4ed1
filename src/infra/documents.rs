use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::infra::http::{BackendError, Connection};

/// Generic client for the backend's document collections. Collection ids
/// come from config; documents are typed per collection by the caller.
#[derive(Clone)]
pub struct Documents {
    conn: Connection,
    database_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentList<T> {
    pub total: i64,
    pub documents: Vec<T>,
}

/// Builder for list queries: equality filters, one order field, a limit,
/// and an optional cursor for pagination.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    equal: Vec<(String, String)>,
    order_by: Option<String>,
    limit: Option<i64>,
    cursor_after: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equal(mut self, field: &str, value: &str) -> Self {
        self.equal.push((field.to_string(), value.to_string()));
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by = Some(format!("-{}", field));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor_after(mut self, document_id: &str) -> Self {
        self.cursor_after = Some(document_id.to_string());
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        for (field, value) in &self.equal {
            params.push(("equal", format!("{}:{}", field, value)));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("order_by", order_by.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &self.cursor_after {
            params.push(("cursor_after", cursor.clone()));
        }
        params
    }
}

impl Documents {
    pub fn new(conn: Connection, database_id: String) -> Self {
        Self { conn, database_id }
    }

    fn collection_path(&self, collection_id: &str) -> String {
        format!(
            "/v1/databases/{}/collections/{}/documents",
            self.database_id, collection_id
        )
    }

    fn document_path(&self, collection_id: &str, document_id: &str) -> String {
        format!("{}/{}", self.collection_path(collection_id), document_id)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        query: ListQuery,
    ) -> Result<DocumentList<T>, BackendError> {
        let builder = self
            .conn
            .request(Method::GET, &self.collection_path(collection_id))
            .query(&query.params());
        self.conn.recv_json(builder).await
    }

    /// Substring search over one field. Single-shot; no pagination.
    pub async fn search<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        field: &str,
        term: &str,
    ) -> Result<DocumentList<T>, BackendError> {
        let builder = self
            .conn
            .request(Method::GET, &self.collection_path(collection_id))
            .query(&[("search", format!("{}:{}", field, term))]);
        self.conn.recv_json(builder).await
    }

    /// Point read; a missing document is `None`, not an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Option<T>, BackendError> {
        let builder = self
            .conn
            .request(Method::GET, &self.document_path(collection_id, document_id));
        match self.conn.recv_json(builder).await {
            Ok(document) => Ok(Some(document)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
        data: serde_json::Value,
    ) -> Result<T, BackendError> {
        let builder = self
            .conn
            .request(Method::POST, &self.collection_path(collection_id))
            .json(&serde_json::json!({ "document_id": document_id, "data": data }));
        self.conn.recv_json(builder).await
    }

    pub async fn update<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
        data: serde_json::Value,
    ) -> Result<T, BackendError> {
        let builder = self
            .conn
            .request(Method::PATCH, &self.document_path(collection_id, document_id))
            .json(&serde_json::json!({ "data": data }));
        self.conn.recv_json(builder).await
    }

    pub async fn delete(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), BackendError> {
        let builder = self
            .conn
            .request(Method::DELETE, &self.document_path(collection_id, document_id));
        self.conn.recv_unit(builder).await
    }
}
