//! Per-file layer memo.
//!
//! Keys are full source paths, so same-named files in different folders never
//! collide. Only successful conversions are stored: a file that failed or is
//! unsupported is looked at again on its next reference.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;

use crate::layer::Layer;

pub struct LayerCache {
    entries: LruCache<PathBuf, Arc<Layer>>,
}

impl Default for LayerCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl LayerCache {
    /// Keep every layer for the lifetime of the cache.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            entries: LruCache::unbounded(),
        }
    }

    /// Keep at most `capacity` layers, evicting the least recently used.
    /// `None` or zero means unbounded.
    #[must_use]
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity.and_then(NonZeroUsize::new) {
            Some(cap) => Self {
                entries: LruCache::new(cap),
            },
            None => Self::unbounded(),
        }
    }

    pub fn get(&mut self, source: &Path) -> Option<Arc<Layer>> {
        self.entries.get(source).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, source: &Path) -> bool {
        self.entries.contains(source)
    }

    pub fn insert(&mut self, source: PathBuf, layer: Arc<Layer>) {
        self.entries.put(source, layer);
    }

    /// Return the memoized layer for `source`, building it on a miss.
    ///
    /// `build` returning `Ok(None)` (unsupported file) or an error stores
    /// nothing.
    pub fn get_or_try_insert<F, E>(&mut self, source: &Path, build: F) -> Result<Option<Arc<Layer>>, E>
    where
        F: FnOnce() -> Result<Option<Layer>, E>,
    {
        if let Some(layer) = self.get(source) {
            return Ok(Some(layer));
        }
        let Some(layer) = build()? else {
            return Ok(None);
        };
        let layer = Arc::new(layer);
        self.insert(source.to_path_buf(), Arc::clone(&layer));
        Ok(Some(layer))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BasemapOption;

    fn layer(name: &str) -> Layer {
        Layer::Basemap(BasemapOption {
            name: name.to_string(),
            url: String::new(),
        })
    }

    #[test]
    fn test_build_runs_once_per_path() {
        let mut cache = LayerCache::unbounded();
        let mut builds = 0;

        for _ in 0..3 {
            let result: Result<_, ()> = cache.get_or_try_insert(Path::new("a/wl1.csv"), || {
                builds += 1;
                Ok(Some(layer("wl1")))
            });
            assert!(result.unwrap().is_some());
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_file_name_in_different_folders() {
        let mut cache = LayerCache::unbounded();
        cache.insert(PathBuf::from("a/data.csv"), Arc::new(layer("a")));
        cache.insert(PathBuf::from("b/data.csv"), Arc::new(layer("b")));
        assert_eq!(cache.get(Path::new("a/data.csv")).unwrap().label(), "a");
        assert_eq!(cache.get(Path::new("b/data.csv")).unwrap().label(), "b");
    }

    #[test]
    fn test_failures_and_unsupported_are_not_memoized() {
        let mut cache = LayerCache::unbounded();
        let failed: Result<_, &str> = cache.get_or_try_insert(Path::new("bad.csv"), || Err("boom"));
        assert!(failed.is_err());
        let unsupported: Result<_, &str> = cache.get_or_try_insert(Path::new("photo.png"), || Ok(None));
        assert!(unsupported.unwrap().is_none());
        assert!(cache.is_empty());
        assert!(!cache.contains(Path::new("bad.csv")));
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut cache = LayerCache::with_capacity(Some(2));
        cache.insert(PathBuf::from("1"), Arc::new(layer("1")));
        cache.insert(PathBuf::from("2"), Arc::new(layer("2")));
        assert!(cache.get(Path::new("1")).is_some());
        cache.insert(PathBuf::from("3"), Arc::new(layer("3")));

        assert!(cache.contains(Path::new("1")));
        assert!(!cache.contains(Path::new("2")));
        assert!(cache.contains(Path::new("3")));
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let mut cache = LayerCache::with_capacity(Some(0));
        for i in 0..10 {
            cache.insert(PathBuf::from(i.to_string()), Arc::new(layer("x")));
        }
        assert_eq!(cache.len(), 10);
    }
}
