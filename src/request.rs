use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::StoreError;
use crate::url_utils;

/// A pending crawl request as stored in the work queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Free-form context carried alongside the request between workers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ctx: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl QueuedRequest {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            depth,
            body: None,
            headers: BTreeMap::new(),
            ctx: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_ctx(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.insert(key.into(), value.into());
        self
    }

    /// Visited-set key for this request.
    pub fn fingerprint(&self) -> u64 {
        url_utils::request_fingerprint(&self.url, self.body.as_deref())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
