//! Where documents and list pages come from.
//!
//! The navigator never fetches anything itself. Expanding a list that is only
//! partially present locally yields a [`PageRequest`]; whoever drives the
//! navigator passes it to a [`DocumentSource`] and hands the resulting
//! [`Page`] back through `Navigator::apply_page`.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::{data::ArchivePath, error::SourceError, lanes::LaneId};

/// A request for elements `offset..offset + limit` of a repeating
/// sub-section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// The lane that asked; responses for a discarded lane are dropped.
    pub lane: LaneId,
    /// Name of the list property on that lane.
    pub list: String,
    /// Reference form of the list location, `/run/0/system`.
    pub path: String,
    pub offset: usize,
    pub limit: usize,
}

/// Elements of one page plus the total length of the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: usize,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// The root document.
    async fn load(&self) -> Result<Arc<Value>, SourceError>;

    /// One page of a list inside the document.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError>;
}

/// Slice a page out of a loaded document.
fn page_of(document: &Value, request: &PageRequest) -> Result<Page, SourceError> {
    let pointer = ArchivePath::from_reference(&request.path)
        .map(|p| p.to_pointer())
        .ok_or_else(|| SourceError::NotFound(request.path.clone()))?;
    let list = document
        .pointer(&pointer)
        .ok_or_else(|| SourceError::NotFound(request.path.clone()))?;
    let Value::Array(items) = list else {
        return Err(SourceError::NotAList(request.path.clone()));
    };
    let start = request.offset.min(items.len());
    let end = request.offset.saturating_add(request.limit).min(items.len());
    Ok(Page {
        items: items[start..end].to_vec(),
        total: items.len(),
    })
}

/// A document already held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    document: Arc<Value>,
}

impl InMemorySource {
    pub fn new(document: impl Into<Arc<Value>>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    async fn load(&self) -> Result<Arc<Value>, SourceError> {
        Ok(self.document.clone())
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        page_of(&self.document, request)
    }
}

/// A JSON document on disk, read on first use.
#[derive(Debug)]
pub struct JsonFileSource {
    path: PathBuf,
    document: OnceCell<Arc<Value>>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn document(&self) -> Result<&Arc<Value>, SourceError> {
        self.document
            .get_or_try_init(|| async {
                let text = tokio::fs::read_to_string(&self.path).await?;
                let value: Value = serde_json::from_str(&text)?;
                info!("loaded archive {}", self.path.display());
                Ok::<_, SourceError>(Arc::new(value))
            })
            .await
    }
}

#[async_trait]
impl DocumentSource for JsonFileSource {
    async fn load(&self) -> Result<Arc<Value>, SourceError> {
        self.document().await.cloned()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let document = self.document().await?;
        debug!(
            "{}: page {} [{}, +{}]",
            self.path.display(),
            request.path,
            request.offset,
            request.limit
        );
        page_of(document, request)
    }
}
