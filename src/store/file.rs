// src/store/file.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::fs;

use super::{assign_id, document_id, Document, DocumentStore, FieldEq, Namespace, Upsert};

/// One pretty-printed JSON file per document: `<root>/<db>/<collection>/<_id>.json`.
///
/// Reads list the collection directory and load only the documents they
/// return. Writes touch only the documents being written, each through a
/// temp file + rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_for(&self, ns: &Namespace) -> PathBuf {
        self.root.join(ns.db()).join(ns.collection())
    }

    fn doc_path(&self, ns: &Namespace, id: i64) -> PathBuf {
        self.dir_for(ns).join(format!("{id}.json"))
    }

    /// Stored keys, ascending. A missing directory is an empty collection.
    async fn ids(&self, ns: &Namespace) -> Result<BTreeSet<i64>> {
        let dir = self.dir_for(ns);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e).with_context(|| format!("list {}", dir.display())),
        };
        let mut ids = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("list {}", dir.display()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    async fn read_doc(&self, ns: &Namespace, id: i64) -> Result<Option<Document>> {
        let path = self.doc_path(ns, id);
        match fs::read_to_string(&path).await {
            Ok(s) => serde_json::from_str(&s)
                .map(Some)
                .with_context(|| format!("parse document {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read document {}", path.display())),
        }
    }

    async fn write_doc(&self, ns: &Namespace, id: i64, doc: &Document) -> Result<()> {
        let dir = self.dir_for(ns);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create store dir {}", dir.display()))?;

        let path = self.doc_path(ns, id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc).context("serialize document")?;
        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename into {}", path.display()))?;
        Ok(())
    }

    /// A listed document that is gone by the time it is read is an error.
    async fn read_listed(&self, ns: &Namespace, id: i64) -> Result<Document> {
        self.read_doc(ns, id)
            .await?
            .with_context(|| format!("document {ns}/{id} vanished while reading"))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn find_latest(
        &self,
        ns: &Namespace,
        filter: Option<FieldEq<'_>>,
    ) -> Result<Option<Document>> {
        for id in self.ids(ns).await?.into_iter().rev() {
            let doc = self.read_listed(ns, id).await?;
            let hit = match filter {
                None => true,
                Some(f) => doc.get(f.field) == Some(f.value),
            };
            if hit {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    async fn find_by_id(&self, ns: &Namespace, id: i64) -> Result<Option<Document>> {
        self.read_doc(ns, id).await
    }

    async fn find_recent(&self, ns: &Namespace, limit: usize) -> Result<Vec<Document>> {
        let mut out = Vec::new();
        for id in self.ids(ns).await?.into_iter().rev().take(limit) {
            out.push(self.read_listed(ns, id).await?);
        }
        Ok(out)
    }

    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<i64>> {
        let mut taken = self.ids(ns).await?;
        // Every key is settled before the first write.
        let mut staged = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let next = taken.last().map_or(1, |max| max + 1);
            let id = assign_id(&mut doc, next)?;
            if !taken.insert(id) {
                bail!("duplicate key: _id {id}");
            }
            staged.push((id, doc));
        }
        for (id, doc) in &staged {
            self.write_doc(ns, *id, doc).await?;
        }
        Ok(staged.into_iter().map(|(id, _)| id).collect())
    }

    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<i64> {
        let ids = self.insert_many(ns, vec![doc]).await?;
        ids.first().copied().context("insert wrote nothing")
    }

    async fn replace_one_upsert(&self, ns: &Namespace, doc: Document) -> Result<Upsert> {
        let id = document_id(&doc).context("upsert requires an integer _id")?;
        let existed = fs::try_exists(self.doc_path(ns, id))
            .await
            .context("check document")?;
        self.write_doc(ns, id, &doc).await?;
        Ok(if existed {
            Upsert::Replaced(id)
        } else {
            Upsert::Inserted(id)
        })
    }

    async fn count(&self, ns: &Namespace) -> Result<usize> {
        Ok(self.ids(ns).await?.len())
    }
}
