//! Process-wide registry of file format managers.
//!
//! Formats register once (normally at startup) and are never
//! deregistered. Lookup is by format name.

use super::{BinaryIoManager, FormatIoManager};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, warn};

type Registry = RwLock<HashMap<&'static str, Arc<dyn FormatIoManager>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, Arc<dyn FormatIoManager>> = HashMap::new();
        let binary = BinaryIoManager::new();
        map.insert(binary.format_name(), Arc::new(binary));
        RwLock::new(map)
    })
}

/// Register a format manager. A name collision keeps the existing
/// manager and logs a warning.
pub fn register_format(manager: Arc<dyn FormatIoManager>) {
    let name = manager.format_name();
    let mut map = registry().write().unwrap_or_else(|e| e.into_inner());
    if map.contains_key(name) {
        warn!(format = name, "IO format already registered, keeping existing");
        return;
    }
    debug!(format = name, "registered IO format");
    map.insert(name, manager);
}

/// Look up a registered format by name.
pub fn format(name: &str) -> Option<Arc<dyn FormatIoManager>> {
    let map = registry().read().unwrap_or_else(|e| e.into_inner());
    map.get(name).cloned()
}

/// Names of all registered formats.
pub fn formats() -> Vec<&'static str> {
    let map = registry().read().unwrap_or_else(|e| e.into_inner());
    let mut names: Vec<&'static str> = map.keys().copied().collect();
    names.sort_unstable();
    names
}
