//! Cluster-wide key/value maps.
//!
//! `Map1` is keyed by a single string; `Map2` by a `(tenant, subkey)` pair. Both are
//! modeled as narrow traits so the façade never depends on whether it is talking to
//! a clustered store or the in-process default. All operations are async to leave
//! room for a clustered implementation behind the same interface; the in-process
//! implementation here never actually suspends.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::DomainError;

#[async_trait]
pub trait Map1<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<V>;

    async fn get_not_found(&self, key: &str) -> Result<V, DomainError> {
        self.get(key)
            .await
            .ok_or_else(|| DomainError::not_found(format!("key '{key}' not found")))
    }

    /// Inserts only if absent; fails if the key already exists.
    async fn add(&self, key: &str, value: V) -> Result<(), DomainError>;

    async fn put(&self, key: &str, value: V);

    async fn remove(&self, key: &str) -> Option<V>;

    async fn remove_not_found(&self, key: &str) -> Result<V, DomainError> {
        self.remove(key)
            .await
            .ok_or_else(|| DomainError::not_found(format!("key '{key}' not found")))
    }

    async fn keys(&self) -> Vec<String>;
}

#[async_trait]
pub trait Map2<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    async fn get(&self, tenant: &str, subkey: &str) -> Option<V>;

    async fn add(&self, tenant: &str, subkey: &str, value: V) -> Result<(), DomainError>;

    async fn put(&self, tenant: &str, subkey: &str, value: V);

    async fn remove(&self, tenant: &str, subkey: &str) -> Option<V>;

    /// All `(subkey, value)` pairs stored under `tenant`.
    async fn list_tenant(&self, tenant: &str) -> Vec<(String, V)>;

    async fn keys(&self) -> Vec<(String, String)>;
}

/// In-process `Map1`, used for single-node operation and tests.
pub struct LocalMap1<V> {
    inner: RwLock<HashMap<String, V>>,
}

impl<V> LocalMap1<V> {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }
}

impl<V> Default for LocalMap1<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Map1<V> for LocalMap1<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().unwrap().get(key).cloned()
    }

    async fn add(&self, key: &str, value: V) -> Result<(), DomainError> {
        let mut guard = self.inner.write().unwrap();
        if guard.contains_key(key) {
            return Err(DomainError::user(format!("key '{key}' already exists")));
        }
        guard.insert(key.to_owned(), value);
        Ok(())
    }

    async fn put(&self, key: &str, value: V) {
        self.inner.write().unwrap().insert(key.to_owned(), value);
    }

    async fn remove(&self, key: &str) -> Option<V> {
        self.inner.write().unwrap().remove(key)
    }

    async fn keys(&self) -> Vec<String> {
        self.inner.read().unwrap().keys().cloned().collect()
    }
}

/// In-process `Map2`, keyed by `(tenant, subkey)`.
pub struct LocalMap2<V> {
    inner: RwLock<HashMap<(String, String), V>>,
}

impl<V> LocalMap2<V> {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }
}

impl<V> Default for LocalMap2<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Map2<V> for LocalMap2<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, tenant: &str, subkey: &str) -> Option<V> {
        self.inner.read().unwrap().get(&(tenant.to_owned(), subkey.to_owned())).cloned()
    }

    async fn add(&self, tenant: &str, subkey: &str, value: V) -> Result<(), DomainError> {
        let mut guard = self.inner.write().unwrap();
        let key = (tenant.to_owned(), subkey.to_owned());
        if guard.contains_key(&key) {
            return Err(DomainError::user(format!("key '{tenant}/{subkey}' already exists")));
        }
        guard.insert(key, value);
        Ok(())
    }

    async fn put(&self, tenant: &str, subkey: &str, value: V) {
        self.inner.write().unwrap().insert((tenant.to_owned(), subkey.to_owned()), value);
    }

    async fn remove(&self, tenant: &str, subkey: &str) -> Option<V> {
        self.inner.write().unwrap().remove(&(tenant.to_owned(), subkey.to_owned()))
    }

    async fn list_tenant(&self, tenant: &str) -> Vec<(String, V)> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .filter(|((t, _), _)| t == tenant)
            .map(|((_, sub), v)| (sub.clone(), v.clone()))
            .collect()
    }

    async fn keys(&self) -> Vec<(String, String)> {
        self.inner.read().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_rejects_duplicate() {
        let map: LocalMap1<i32> = LocalMap1::new();
        map.add("a", 1).await.unwrap();
        assert!(map.add("a", 2).await.is_err());
        assert_eq!(map.get("a").await, Some(1));
    }

    #[tokio::test]
    async fn put_overwrites() {
        let map: LocalMap1<i32> = LocalMap1::new();
        map.put("a", 1).await;
        map.put("a", 2).await;
        assert_eq!(map.get("a").await, Some(2));
    }

    #[tokio::test]
    async fn get_not_found_fails() {
        let map: LocalMap1<i32> = LocalMap1::new();
        assert!(map.get_not_found("missing").await.is_err());
    }

    #[tokio::test]
    async fn map2_lists_by_tenant() {
        let map: LocalMap2<i32> = LocalMap2::new();
        map.put("t1", "job-1", 1).await;
        map.put("t1", "job-2", 2).await;
        map.put("t2", "job-3", 3).await;
        let mut listed = map.list_tenant("t1").await;
        listed.sort();
        assert_eq!(listed, vec![("job-1".to_owned(), 1), ("job-2".to_owned(), 2)]);
    }
}
