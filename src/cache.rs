use crate::config::LoadOptions;
use crate::error::MapError;
use crate::loader::load_file;
use crate::map::EditableTileMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Loaded maps shared by key, so a map used by several scenes is parsed
/// once.
///
/// Each key gets its own load lock: concurrent callers asking for the same
/// key wait for one load and then share its `Arc`, while other keys are
/// served and loaded meanwhile. Failed loads are not remembered. A loader
/// must not ask the cache for its own key.
#[derive(Debug, Default)]
pub struct TileMapCache {
    maps: Mutex<HashMap<String, Arc<EditableTileMap>>>,
    loading: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

// a panicking loader leaves both tables consistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TileMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &self,
        key: &str,
        loader: impl FnOnce() -> Result<EditableTileMap, MapError>,
    ) -> Result<Arc<EditableTileMap>, MapError> {
        if let Some(map) = self.get(key) {
            debug!(key, "tile map cache hit");
            return Ok(map);
        }

        let key_lock = Arc::clone(lock(&self.loading).entry(key.to_owned()).or_default());
        let _loading = lock(&key_lock);
        // someone else may have finished loading while we waited
        if let Some(map) = self.get(key) {
            return Ok(map);
        }

        let loaded = loader().map(Arc::new);
        if let Ok(map) = &loaded {
            lock(&self.maps).insert(key.to_owned(), Arc::clone(map));
        }
        lock(&self.loading).remove(key);
        loaded
    }

    /// [`load_file`] through the cache, keyed by path and level.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<Arc<EditableTileMap>, MapError> {
        let path = path.as_ref();
        let key = format!("{}|{}", path.display(), options.level_index);
        self.get_or_load(&key, || load_file(path, options))
    }

    pub fn get(&self, key: &str) -> Option<Arc<EditableTileMap>> {
        lock(&self.maps).get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Arc<EditableTileMap>> {
        lock(&self.maps).remove(key)
    }

    pub fn clear(&self) {
        lock(&self.maps).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.maps).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.maps).is_empty()
    }
}
