//! In-process tree store.
//!
//! Mirrors the hosted database's observable semantics: absent nodes read as
//! `null`, `null` and empty objects are never stored, and removing the last
//! child of an object removes the object as well.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use portfolio_core::{KeyError, StoreKey};

use super::{PushIdGenerator, StoreError, StorePath, TreeStore};

/// A tree store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryTree {
    root: RwLock<Value>,
    push_ids: Mutex<PushIdGenerator>,
}

impl MemoryTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree whose root holds `value`.
    #[must_use]
    pub fn with_root(value: Value) -> Self {
        Self {
            root: RwLock::new(normalize(value)),
            push_ids: Mutex::new(PushIdGenerator::new()),
        }
    }

    /// A copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

#[async_trait]
impl TreeStore for MemoryTree {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &StorePath) -> Result<Value, StoreError> {
        let root = self.root.read().await;
        Ok(lookup(&root, path).cloned().unwrap_or(Value::Null))
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn set(&self, path: &StorePath, value: &Value) -> Result<(), StoreError> {
        let mut root = self.root.write().await;
        write(&mut root, path, value.clone());
        Ok(())
    }

    #[instrument(skip(self, changes), fields(path = %path))]
    async fn update(
        &self,
        path: &StorePath,
        changes: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        // Validate every child path before touching the tree so a bad key
        // leaves it unchanged.
        let children = changes
            .iter()
            .map(|(key, value)| {
                let relative = StorePath::parse(key)?;
                if relative.is_root() {
                    return Err(StoreError::InvalidKey(KeyError::Empty));
                }
                Ok((path.join(&relative), value))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut root = self.root.write().await;
        for (child, value) in children {
            write(&mut root, &child, value.clone());
        }
        Ok(())
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn push(&self, path: &StorePath, value: &Value) -> Result<StoreKey, StoreError> {
        let key = self.push_ids.lock().await.next_key()?;
        let mut root = self.root.write().await;
        write(&mut root, &path.child(&key), value.clone());
        Ok(key)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut root = self.root.write().await;
        write(&mut root, path, Value::Null);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn lookup<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments()
        .try_fold(root, |node, key| node.as_object()?.get(key.as_str()))
}

/// Write `value` at `path`, removing the node when the value is empty.
fn write(root: &mut Value, path: &StorePath, value: Value) {
    let value = normalize(value);
    let segments: Vec<&StoreKey> = path.segments().collect();
    write_at(root, &segments, value);
}

fn write_at(node: &mut Value, segments: &[&StoreKey], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if value.is_null() {
        // Removing: nothing to do if the branch does not exist.
        let Some(map) = node.as_object_mut() else {
            return;
        };
        if let Some(child) = map.get_mut(first.as_str()) {
            write_at(child, rest, Value::Null);
            if child.is_null() {
                map.remove(first.as_str());
            }
        }
        if map.is_empty() {
            *node = Value::Null;
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        let child = map.entry(first.as_str()).or_insert(Value::Null);
        write_at(child, rest, value);
    }
}

/// Drop nulls and empty objects, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, normalize(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_get_missing_is_null() {
        let tree = MemoryTree::new();
        assert_eq!(tree.get(&path("portfolio/profile")).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_set_replaces_entirely() {
        let tree = MemoryTree::new();
        let profile = path("portfolio/profile");
        tree.set(&profile, &json!({"name": "A", "title": "Dev"}))
            .await
            .unwrap();
        tree.set(&profile, &json!({"name": "B"})).await.unwrap();

        assert_eq!(tree.get(&profile).await.unwrap(), json!({"name": "B"}));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let tree = MemoryTree::with_root(json!({
            "portfolio": {"projects": {"p1": {"title": "Old", "year": 2020}}}
        }));
        let entry = path("portfolio/projects/p1");
        tree.update(&entry, &fields(json!({"title": "New"})))
            .await
            .unwrap();

        assert_eq!(
            tree.get(&entry).await.unwrap(),
            json!({"title": "New", "year": 2020})
        );
    }

    #[tokio::test]
    async fn test_update_null_removes_field() {
        let tree = MemoryTree::with_root(json!({"a": {"x": 1, "y": 2}}));
        tree.update(&path("a"), &fields(json!({"x": null})))
            .await
            .unwrap();
        assert_eq!(tree.snapshot().await, json!({"a": {"y": 2}}));
    }

    #[tokio::test]
    async fn test_update_multi_path_keys() {
        let tree = MemoryTree::new();
        tree.update(&path("a"), &fields(json!({"b/c": 1})))
            .await
            .unwrap();
        assert_eq!(tree.snapshot().await, json!({"a": {"b": {"c": 1}}}));
    }

    #[tokio::test]
    async fn test_update_invalid_key_leaves_tree_unchanged() {
        let tree = MemoryTree::with_root(json!({"a": {"x": 1}}));
        let result = tree
            .update(&path("a"), &fields(json!({"x": 2, "bad.key": 3})))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
        assert_eq!(tree.snapshot().await, json!({"a": {"x": 1}}));
    }

    #[tokio::test]
    async fn test_push_generates_distinct_keys() {
        let tree = MemoryTree::new();
        let projects = path("portfolio/projects");
        let first = tree.push(&projects, &json!({"title": "One"})).await.unwrap();
        let second = tree.push(&projects, &json!({"title": "Two"})).await.unwrap();

        assert_ne!(first, second);
        let stored = tree.get(&projects).await.unwrap();
        assert_eq!(stored[first.as_str()], json!({"title": "One"}));
        assert_eq!(stored[second.as_str()], json!({"title": "Two"}));
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_parents() {
        let tree = MemoryTree::with_root(json!({
            "portfolio": {"projects": {"p1": {"title": "T"}}, "profile": {"name": "A"}}
        }));
        tree.delete(&path("portfolio/projects/p1")).await.unwrap();
        assert_eq!(
            tree.snapshot().await,
            json!({"portfolio": {"profile": {"name": "A"}}})
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let tree = MemoryTree::with_root(json!({"portfolio": {"profile": {"name": "A"}}}));
        tree.delete(&path("portfolio/projects/nope")).await.unwrap();
        assert_eq!(
            tree.snapshot().await,
            json!({"portfolio": {"profile": {"name": "A"}}})
        );
    }

    #[tokio::test]
    async fn test_empty_values_are_not_stored() {
        let tree = MemoryTree::new();
        tree.set(&path("portfolio/profile"), &json!({})).await.unwrap();
        tree.set(&path("portfolio/socials"), &json!({"github": null}))
            .await
            .unwrap();
        assert_eq!(tree.snapshot().await, Value::Null);
    }

    #[tokio::test]
    async fn test_set_through_scalar_replaces_it() {
        let tree = MemoryTree::with_root(json!({"a": 5}));
        tree.set(&path("a/b"), &json!(1)).await.unwrap();
        assert_eq!(tree.snapshot().await, json!({"a": {"b": 1}}));
    }
}
