/* This file is part of the Caption Relay project
*
*  Copyright (C) 2025 mini_bomba
*  
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::{collections::HashMap, hash::Hash, sync::{PoisonError, RwLock}};

/// A key-value store for results that never change once computed
pub trait Cache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn set(&self, key: K, value: V);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-process cache, lives as long as the server does
pub struct MemoryCache<K, V> {
    map: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryCache<K, V> {
    pub fn new() -> Self {
        Self { map: RwLock::new(HashMap::new()) }
    }
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// a panic while holding the lock can't leave a half-written entry behind, so poisoning is ignored
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.map.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: K, value: V) {
        self.map.write().unwrap_or_else(PoisonError::into_inner).insert(key, value);
    }

    fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_get_set() {
        let cache: MemoryCache<String, Arc<str>> = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a".to_owned()), None);

        cache.set("a".to_owned(), "first".into());
        cache.set("a".to_owned(), "second".into());
        assert_eq!(cache.get(&"a".to_owned()).as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_tuple_keys() {
        let cache: MemoryCache<(String, String), usize> = MemoryCache::new();
        cache.set(("vid".to_owned(), "en".to_owned()), 1);
        cache.set(("vid".to_owned(), "es".to_owned()), 2);
        assert_eq!(cache.get(&("vid".to_owned(), "es".to_owned())), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_access() {
        let cache: Arc<dyn Cache<usize, usize>> = Arc::new(MemoryCache::new());
        let handles: Vec<_> = (0..8).map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    cache.set(t * 100 + i, i);
                    assert_eq!(cache.get(&(t * 100 + i)), Some(i));
                }
            })
        }).collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }

    #[test]
    fn test_survives_poisoning() {
        let cache = Arc::new(MemoryCache::<u8, u8>::new());
        cache.set(1, 1);
        let poisoner = cache.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.map.write().unwrap();
            panic!("poison the lock");
        }).join();
        assert!(cache.map.is_poisoned());
        assert_eq!(cache.get(&1), Some(1));
        cache.set(2, 2);
        assert_eq!(cache.len(), 2);
    }
}
