//! The cache of compiled pages.
//!
//! ```text
//! Registry
//! ├── slots: RwLock<HashMap<path, Arc<Slot>>>
//! │   └── Slot
//! │       ├── page: RwLock<Option<Arc<Page>>>   published pages, read by every render
//! │       └── compile: Mutex<()>                 one compilation per path at a time
//! └── inline: RwLock<HashMap<path, source>>
//!
//! get_or_compile:
//! 1. page published and fresh        -> return it
//! 2. take the slot's compile gate
//! 3. published while we waited       -> return it
//! 4. load the source, compile, publish
//! ```
//!
//! The map lock is only held to find or create a slot, so compiling one path never
//! blocks renders of another. Failed compilations publish nothing: the gate is released
//! when the guard drops and the next caller compiles from scratch. A slot that never held
//! a page is removed on failure, so lookups of missing paths leave nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::errors::Result;
use crate::page::Page;
use crate::source::TemplateSource;
use crate::utils::normalize_path;

#[derive(Debug, Default)]
struct Slot {
    page: RwLock<Option<Arc<Page>>>,
    compile: Mutex<()>,
}

#[derive(Debug, Default)]
pub struct Registry {
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    inline: RwLock<HashMap<String, String>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    fn slot(&self, path: &str) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().get(path) {
            return slot.clone();
        }
        self.slots.write().entry(path.to_string()).or_default().clone()
    }

    /// The published page of a slot, unless its source changed since it was compiled
    fn fresh(
        slot: &Slot,
        source: &dyn TemplateSource,
        check_modifications: bool,
    ) -> Option<Arc<Page>> {
        let page = slot.page.read().clone()?;
        if check_modifications && !page.from_inline {
            let current = source.revision(&page.path);
            if current != page.revision {
                tracing::debug!(path = %page.path, "Page source changed, recompiling");
                return None;
            }
        }
        Some(page)
    }

    fn compile(&self, path: &str, source: &dyn TemplateSource) -> Result<Page> {
        let inline = self.inline.read().get(path).cloned();
        let result = match inline {
            Some(text) => Page::new_inline(path, &text),
            None => {
                let loaded = source.load(path)?;
                Page::new(path, &loaded.text, loaded.revision)
            }
        };
        if let Err(ref e) = result {
            tracing::warn!(path = %path, error = %e, "Page failed to compile");
        }
        result
    }

    /// Returns the compiled page for that path, compiling it if needed.
    ///
    /// Concurrent callers asking for a path that isn't compiled yet wait for a single
    /// compilation and all get its result.
    pub fn get_or_compile(
        &self,
        path: &str,
        source: &dyn TemplateSource,
        check_modifications: bool,
    ) -> Result<Arc<Page>> {
        let path = normalize_path(path);
        let slot = self.slot(&path);

        if let Some(page) = Self::fresh(&slot, source, check_modifications) {
            tracing::trace!(path = %path, "Page cache hit");
            return Ok(page);
        }

        let _gate = slot.compile.lock();
        if let Some(page) = Self::fresh(&slot, source, check_modifications) {
            return Ok(page);
        }

        tracing::debug!(path = %path, "Compiling page");
        let page = match self.compile(&path, source) {
            Ok(page) => Arc::new(page),
            Err(e) => {
                self.drop_if_empty(&path, &slot);
                return Err(e);
            }
        };
        *slot.page.write() = Some(page.clone());
        Ok(page)
    }

    /// Removes a slot that never got a page, unless it was already replaced
    fn drop_if_empty(&self, path: &str, slot: &Arc<Slot>) {
        let mut slots = self.slots.write();
        let is_current = slots.get(path).map_or(false, |current| Arc::ptr_eq(current, slot));
        if is_current && slot.page.read().is_none() {
            slots.remove(path);
        }
    }

    /// The published page for that path, if any, without compiling or checking freshness
    pub fn cached(&self, path: &str) -> Option<Arc<Page>> {
        let slot = self.slots.read().get(&normalize_path(path)).cloned()?;
        let page = slot.page.read().clone();
        page
    }

    /// Drops the cached page of that path. Renders already holding it finish with it.
    pub fn invalidate(&self, path: &str) {
        let path = normalize_path(path);
        if self.slots.write().remove(&path).is_some() {
            tracing::debug!(path = %path, "Invalidated page");
        }
    }

    /// Drops every cached page
    pub fn invalidate_all(&self) {
        let mut slots = self.slots.write();
        tracing::debug!(count = slots.len(), "Invalidated all pages");
        slots.clear();
    }

    /// Registers a source for that path, taking precedence over the template source
    pub fn register_inline(&self, path: &str, text: impl Into<String>) {
        let path = normalize_path(path);
        self.inline.write().insert(path.clone(), text.into());
        self.invalidate(&path);
    }

    /// Removes an inline source, returning whether there was one
    pub fn unregister_inline(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let existed = self.inline.write().remove(&path).is_some();
        if existed {
            self.invalidate(&path);
        }
        existed
    }

    /// Whether a template exists at that path, inline or in the source
    pub fn exists(&self, path: &str, source: &dyn TemplateSource) -> bool {
        let path = normalize_path(path);
        self.inline.read().contains_key(&path) || source.exists(&path)
    }

    /// Paths of every inline template, sorted
    pub fn inline_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inline.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of paths with a slot
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
