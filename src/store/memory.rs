// src/store/memory.rs
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Collection, Document, DocumentStore, FieldEq, Namespace, Upsert};

/// Process-local store. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<Namespace, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, ns: &Namespace, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut map = self.inner.lock().expect("memory store mutex poisoned");
        f(map.entry(ns.clone()).or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_latest(
        &self,
        ns: &Namespace,
        filter: Option<FieldEq<'_>>,
    ) -> Result<Option<Document>> {
        Ok(self.with(ns, |c| c.latest(filter).cloned()))
    }

    async fn find_by_id(&self, ns: &Namespace, id: i64) -> Result<Option<Document>> {
        Ok(self.with(ns, |c| c.get(id).cloned()))
    }

    async fn find_recent(&self, ns: &Namespace, limit: usize) -> Result<Vec<Document>> {
        Ok(self.with(ns, |c| c.recent(limit)))
    }

    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<i64>> {
        self.with(ns, |c| c.insert_many(docs))
    }

    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<i64> {
        self.with(ns, |c| c.insert(doc))
    }

    async fn replace_one_upsert(&self, ns: &Namespace, doc: Document) -> Result<Upsert> {
        self.with(ns, |c| c.replace_upsert(doc))
    }

    async fn count(&self, ns: &Namespace) -> Result<usize> {
        Ok(self.with(ns, |c| c.len()))
    }
}
