//! # Document Store
//! Minimal document-store surface shared by the aggregator and the digest.
//!
//! Documents are JSON objects keyed by an integer `_id`. A collection lives
//! in a `(database, collection)` namespace, e.g. `twitter/northernline`.
//! Reads are "latest by key", "exact key" and "recent N"; writes are
//! insert-one, insert-many and replace-one-with-upsert.

pub mod collection;
pub mod file;
pub mod memory;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use collection::Collection;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Field holding the document key.
pub const ID_FIELD: &str = "_id";

pub type Document = Map<String, Value>;

/// `(database, collection)` pair addressing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    db: String,
    collection: String,
}

impl Namespace {
    /// Both parts end up as path segments in the file store, so only
    /// `[A-Za-z0-9_-]` is accepted.
    pub fn new(db: &str, collection: &str) -> Result<Self> {
        for part in [db, collection] {
            let ok = !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !ok {
                bail!("invalid namespace segment {part:?}");
            }
        }
        Ok(Self {
            db: db.to_string(),
            collection: collection.to_string(),
        })
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.db, self.collection)
    }
}

/// Result of a replace-one-with-upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(i64),
    Replaced(i64),
}

/// Field equality filter for [`DocumentStore::find_latest`].
#[derive(Debug, Clone, Copy)]
pub struct FieldEq<'a> {
    pub field: &'a str,
    pub value: &'a Value,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Highest-keyed document, optionally restricted to documents matching `filter`.
    async fn find_latest(&self, ns: &Namespace, filter: Option<FieldEq<'_>>)
        -> Result<Option<Document>>;

    async fn find_by_id(&self, ns: &Namespace, id: i64) -> Result<Option<Document>>;

    /// Up to `limit` documents, highest key first.
    async fn find_recent(&self, ns: &Namespace, limit: usize) -> Result<Vec<Document>>;

    /// Inserts in the given order; fails on the first duplicate key without writing.
    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<i64>>;

    /// A document without `_id` gets the next sequential key.
    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<i64>;

    async fn replace_one_upsert(&self, ns: &Namespace, doc: Document) -> Result<Upsert>;

    async fn count(&self, ns: &Namespace) -> Result<usize>;
}

/// Serialize a record into a store document (must serialize to a JSON object).
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record).context("serialize document")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("expected a JSON object, got {other}")),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).context("deserialize document")
}

/// Key of `doc`, giving it `next` first when `_id` is absent or null.
pub(crate) fn assign_id(doc: &mut Document, next: i64) -> Result<i64> {
    match doc.get(ID_FIELD) {
        None | Some(Value::Null) => {
            doc.insert(ID_FIELD.to_string(), Value::from(next));
            Ok(next)
        }
        Some(_) => document_id(doc).ok_or_else(|| anyhow!("_id must be an integer")),
    }
}

/// Key of a document, if it carries an integer `_id`.
pub fn document_id(doc: &Document) -> Option<i64> {
    doc.get(ID_FIELD).and_then(Value::as_i64)
}
