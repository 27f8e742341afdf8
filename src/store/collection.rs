// src/store/collection.rs
use anyhow::{anyhow, bail, Result};
use std::collections::BTreeMap;

use super::{assign_id, document_id, Document, FieldEq, Upsert};

/// In-memory contents of one collection, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    docs: BTreeMap<i64, Document>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn latest(&self, filter: Option<FieldEq<'_>>) -> Option<&Document> {
        self.docs.values().rev().find(|doc| match filter {
            None => true,
            Some(f) => doc.get(f.field) == Some(f.value),
        })
    }

    pub fn get(&self, id: i64) -> Option<&Document> {
        self.docs.get(&id)
    }

    pub fn recent(&self, limit: usize) -> Vec<Document> {
        self.docs.values().rev().take(limit).cloned().collect()
    }

    fn next_id(&self) -> i64 {
        self.docs.keys().next_back().map_or(1, |max| max + 1)
    }

    pub fn insert(&mut self, mut doc: Document) -> Result<i64> {
        let id = assign_id(&mut doc, self.next_id())?;
        if self.docs.contains_key(&id) {
            bail!("duplicate key: _id {id}");
        }
        self.docs.insert(id, doc);
        Ok(id)
    }

    /// All-or-nothing: keys are checked before anything is written.
    pub fn insert_many(&mut self, docs: Vec<Document>) -> Result<Vec<i64>> {
        let mut staged = self.clone();
        let ids = docs
            .into_iter()
            .map(|doc| staged.insert(doc))
            .collect::<Result<Vec<_>>>()?;
        *self = staged;
        Ok(ids)
    }

    pub fn replace_upsert(&mut self, doc: Document) -> Result<Upsert> {
        let id = document_id(&doc).ok_or_else(|| anyhow!("upsert requires an integer _id"))?;
        Ok(match self.docs.insert(id, doc) {
            Some(_) => Upsert::Replaced(id),
            None => Upsert::Inserted(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_document;
    use serde_json::{json, Value};

    fn doc(v: Value) -> Document {
        to_document(&v).unwrap()
    }

    #[test]
    fn assigns_sequential_ids() {
        let mut c = Collection::default();
        assert_eq!(c.insert(doc(json!({"a": 1}))).unwrap(), 1);
        assert_eq!(c.insert(doc(json!({"a": 2}))).unwrap(), 2);
        assert_eq!(c.insert(doc(json!({"_id": 10}))).unwrap(), 10);
        assert_eq!(c.insert(doc(json!({"a": 3}))).unwrap(), 11);
    }

    #[test]
    fn insert_many_is_atomic_on_duplicate() {
        let mut c = Collection::default();
        c.insert(doc(json!({"_id": 5}))).unwrap();
        let err = c
            .insert_many(vec![doc(json!({"_id": 6})), doc(json!({"_id": 5}))])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn latest_honours_filter() {
        let mut c = Collection::default();
        c.insert(doc(json!({"_area": "a"}))).unwrap();
        c.insert(doc(json!({"_area": "b"}))).unwrap();
        c.insert(doc(json!({"_area": "a", "n": 3}))).unwrap();
        c.insert(doc(json!({"_area": "b", "n": 4}))).unwrap();

        let a = json!("a");
        let hit = c
            .latest(Some(FieldEq {
                field: "_area",
                value: &a,
            }))
            .unwrap();
        assert_eq!(hit.get("n"), Some(&json!(3)));
        assert_eq!(document_id(c.latest(None).unwrap()), Some(4));
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut c = Collection::default();
        let first = c.replace_upsert(doc(json!({"_id": 20261018, "text": "a"}))).unwrap();
        let second = c.replace_upsert(doc(json!({"_id": 20261018, "text": "b"}))).unwrap();
        assert_eq!(first, Upsert::Inserted(20261018));
        assert_eq!(second, Upsert::Replaced(20261018));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(20261018).unwrap().get("text"), Some(&json!("b")));
    }
}
