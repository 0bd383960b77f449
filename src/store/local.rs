use atomic_write_file::AtomicWriteFile;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{compare_values, Filter, Query, Record, RecordStore, StoreError, CONTENT_ITEMS};

const STORE_VERSION: u32 = 1;

/// Columns that must be unique within a collection
const UNIQUE_COLUMNS: &[(&str, &str)] = &[(CONTENT_ITEMS, "slug")];

/// Get the default local store path (~/.config/founder-check/store.json)
pub fn get_local_store_path() -> PathBuf {
    crate::config::get_config_dir().join("store.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalData {
    version: u32,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Record>>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            collections: BTreeMap::new(),
        }
    }
}

/// Record store backed by a single JSON file.
///
/// Every operation reads the file, applies the change and writes it back
/// atomically, so the file is never left half-written.
pub struct LocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<LocalData, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_data(&path))
            .await
            .map_err(|e| StoreError::Other {
                message: format!("Task join error: {}", e),
            })?
    }

    async fn write(&self, data: LocalData) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_data(&path, &data))
            .await
            .map_err(|e| StoreError::Other {
                message: format!("Task join error: {}", e),
            })?
    }
}

fn load_data(path: &Path) -> Result<LocalData, StoreError> {
    if !path.exists() {
        return Ok(LocalData::default());
    }

    let file = File::open(path).map_err(|e| StoreError::Unavailable {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;

    let data: LocalData = serde_json::from_reader(file).map_err(|e| StoreError::Other {
        message: format!("failed to parse {}: {}", path.display(), e),
    })?;

    if data.version != STORE_VERSION {
        return Err(StoreError::Other {
            message: format!("unsupported local store version: {}", data.version),
        });
    }

    Ok(data)
}

fn save_data(path: &Path, data: &LocalData) -> Result<(), StoreError> {
    let io_err = |e: std::io::Error| StoreError::Unavailable {
        reason: format!("failed to write {}: {}", path.display(), e),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let mut file = AtomicWriteFile::open(path).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut file, data).map_err(|e| StoreError::Other {
        message: format!("failed to serialize local store: {}", e),
    })?;
    file.commit().map_err(io_err)?;

    Ok(())
}

fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// Reject `candidate` if it repeats a unique column value of another record
fn check_unique(
    collection: &str,
    rows: &[Record],
    candidate: &Record,
    skip_index: Option<usize>,
) -> Result<(), StoreError> {
    for (_, column) in UNIQUE_COLUMNS.iter().filter(|(c, _)| *c == collection) {
        let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
            continue;
        };
        let clash = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip_index)
            .any(|(_, row)| row.get(*column) == Some(value));
        if clash {
            return Err(StoreError::UniqueViolation {
                message: format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    collection, column
                ),
            });
        }
    }
    Ok(())
}

impl RecordStore for LocalStore {
    async fn insert(&self, collection: &str, mut record: Record) -> Result<Record, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        let rows = data.collections.entry(collection.to_string()).or_default();

        if !record.contains_key("id") {
            record.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if !record.contains_key("created_at") {
            record.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        }
        check_unique(collection, rows, &record, None)?;

        rows.push(record.clone());
        self.write(data).await?;

        tracing::debug!(collection, "inserted local record");
        Ok(record)
    }

    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.read().await?;

        let mut rows: Vec<Record> = data
            .collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| matches_all(r, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.field).unwrap_or(&Value::Null);
                let b = b.get(&order.field).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<Vec<Record>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        let Some(rows) = data.collections.get_mut(collection) else {
            return Ok(Vec::new());
        };

        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches_all(r, filters))
            .map(|(i, _)| i)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for i in targets {
            let mut merged = rows[i].clone();
            for (key, value) in &patch {
                merged.insert(key.clone(), value.clone());
            }
            check_unique(collection, rows, &merged, Some(i))?;
            rows[i] = merged.clone();
            updated.push(merged);
        }

        if !updated.is_empty() {
            self.write(data).await?;
        }
        Ok(updated)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        let Some(rows) = data.collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|r| !matches_all(r, filters));
        let removed = before - rows.len();

        if removed > 0 {
            self.write(data).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SUBMISSIONS;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let (_dir, store) = temp_store();
        let saved = store
            .insert(SUBMISSIONS, record(json!({"email": "a@b.co"})))
            .await
            .unwrap();
        assert!(saved.get("id").and_then(Value::as_str).is_some());
        assert!(saved.get("created_at").is_some());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_select_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        let rows = store.select(SUBMISSIONS, &Query::new()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_limits() {
        let (_dir, store) = temp_store();
        for (slug, order) in [("b", 2), ("a", 1), ("c", 3)] {
            store
                .insert(CONTENT_ITEMS, record(json!({"slug": slug, "display_order": order})))
                .await
                .unwrap();
        }

        let rows = store
            .select(CONTENT_ITEMS, &Query::new().order_by("display_order", true))
            .await
            .unwrap();
        let slugs: Vec<_> = rows.iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);

        let rows = store
            .select(
                CONTENT_ITEMS,
                &Query::new()
                    .filter(Filter::neq("slug", "a"))
                    .order_by("display_order", false)
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["slug"], "c");
    }

    #[tokio::test]
    async fn test_unique_slug_enforced() {
        let (_dir, store) = temp_store();
        store
            .insert(CONTENT_ITEMS, record(json!({"slug": "intro"})))
            .await
            .unwrap();
        let err = store
            .insert(CONTENT_ITEMS, record(json!({"slug": "intro"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let (_dir, store) = temp_store();
        let saved = store
            .insert(CONTENT_ITEMS, record(json!({"slug": "intro", "title": "Old"})))
            .await
            .unwrap();
        let id = saved["id"].clone();

        let updated = store
            .update(
                CONTENT_ITEMS,
                &[Filter::eq("id", id.clone())],
                record(json!({"title": "New"})),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["title"], "New");
        assert_eq!(updated[0]["slug"], "intro");

        let rows = store
            .select(CONTENT_ITEMS, &Query::new().filter(Filter::eq("id", id)))
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "New");
    }

    #[tokio::test]
    async fn test_update_rejects_slug_clash() {
        let (_dir, store) = temp_store();
        store
            .insert(CONTENT_ITEMS, record(json!({"slug": "one"})))
            .await
            .unwrap();
        let two = store
            .insert(CONTENT_ITEMS, record(json!({"slug": "two"})))
            .await
            .unwrap();
        let err = store
            .update(
                CONTENT_ITEMS,
                &[Filter::eq("id", two["id"].clone())],
                record(json!({"slug": "one"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_counts() {
        let (_dir, store) = temp_store();
        store
            .insert(SUBMISSIONS, record(json!({"email": "a@b.co"})))
            .await
            .unwrap();
        store
            .insert(SUBMISSIONS, record(json!({"email": "c@d.co"})))
            .await
            .unwrap();

        let removed = store
            .delete(SUBMISSIONS, &[Filter::eq("email", "a@b.co")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.select(SUBMISSIONS, &Query::new()).await.unwrap().len(), 1);
        assert_eq!(store.delete("nothing_here", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_unknown_version() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), r#"{"version": 9, "collections": {}}"#).unwrap();
        assert!(store.select(SUBMISSIONS, &Query::new()).await.is_err());
    }
}
