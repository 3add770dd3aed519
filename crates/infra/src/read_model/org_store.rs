use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use stockcast_core::OrganizationId;

/// Organization-isolated key/value store backing the in-memory adapters.
pub trait OrgStore<K, V>: Send + Sync {
    fn get(&self, org: OrganizationId, key: &K) -> Option<V>;
    fn upsert(&self, org: OrganizationId, key: K, value: V);
    fn list(&self, org: OrganizationId) -> Vec<V>;
}

impl<K, V, S> OrgStore<K, V> for Arc<S>
where
    S: OrgStore<K, V> + ?Sized,
{
    fn get(&self, org: OrganizationId, key: &K) -> Option<V> {
        (**self).get(org, key)
    }

    fn upsert(&self, org: OrganizationId, key: K, value: V) {
        (**self).upsert(org, key, value)
    }

    fn list(&self, org: OrganizationId) -> Vec<V> {
        (**self).list(org)
    }
}

#[derive(Debug)]
pub struct InMemoryOrgStore<K, V> {
    inner: RwLock<HashMap<(OrganizationId, K), V>>,
}

impl<K, V> InMemoryOrgStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryOrgStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryOrgStore<K, V>
where
    K: Eq + Hash,
{
    /// Read-modify-write under one write lock. `None` if the key is absent
    /// (or the lock is poisoned).
    pub fn update<R>(&self, org: OrganizationId, key: K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut map = self.inner.write().ok()?;
        map.get_mut(&(org, key)).map(f)
    }

    /// Like [`update`](Self::update), inserting `V::default()` first when absent.
    pub fn upsert_with<R>(
        &self,
        org: OrganizationId,
        key: K,
        f: impl FnOnce(&mut V) -> R,
    ) -> Option<R>
    where
        V: Default,
    {
        let mut map = self.inner.write().ok()?;
        Some(f(map.entry((org, key)).or_default()))
    }

    /// Remove every record matching `pred`; returns how many were removed.
    pub fn remove_where(&self, mut pred: impl FnMut(&V) -> bool) -> usize {
        let Ok(mut map) = self.inner.write() else {
            return 0;
        };
        let before = map.len();
        map.retain(|_, v| !pred(v));
        before - map.len()
    }
}

impl<K, V> OrgStore<K, V> for InMemoryOrgStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, org: OrganizationId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(org, key.clone())).cloned()
    }

    fn upsert(&self, org: OrganizationId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((org, key), value);
        }
    }

    fn list(&self, org: OrganizationId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((o, _k), v)| if *o == org { Some(v.clone()) } else { None })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizations_are_isolated() {
        let store: InMemoryOrgStore<u32, String> = InMemoryOrgStore::new();
        let (a, b) = (OrganizationId::new(), OrganizationId::new());
        store.upsert(a, 1, "a1".into());
        store.upsert(b, 1, "b1".into());

        assert_eq!(store.get(a, &1).as_deref(), Some("a1"));
        assert_eq!(store.list(b), vec!["b1".to_string()]);

        let removed = store.remove_where(|v| v.starts_with('a'));
        assert_eq!(removed, 1);
        assert!(store.list(a).is_empty());
        assert_eq!(store.list(b).len(), 1);
    }

    #[test]
    fn upsert_with_starts_from_default() {
        let store: InMemoryOrgStore<&'static str, u64> = InMemoryOrgStore::new();
        let org = OrganizationId::new();
        let bump = |n: &mut u64| {
            *n += 1;
            *n
        };
        assert_eq!(store.upsert_with(org, "k", bump), Some(1));
        assert_eq!(store.upsert_with(org, "k", bump), Some(2));
        assert_eq!(store.update(org, "missing", |n| *n), None);
    }
}
