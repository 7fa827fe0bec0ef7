//! Where template sources come from.
//!
//! The engine only needs to load a template by logical path, know whether one exists,
//! know its current revision to detect changes, and enumerate everything for
//! precompilation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use globwalk::GlobWalkerBuilder;
use parking_lot::RwLock;

use crate::errors::{Error, Result};
use crate::utils::normalize_path;

/// The text of a template and the revision it was read at
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub text: String,
    /// Changes whenever the text changes. `None` if the store can't tell
    pub revision: Option<u64>,
}

/// A store of template sources addressed by normalized logical paths
pub trait TemplateSource: Send + Sync + fmt::Debug {
    /// Reads a template, failing with `TemplateNotFound` if there is none at that path
    fn load(&self, path: &str) -> Result<Source>;

    /// Whether a template exists at that path
    fn exists(&self, path: &str) -> bool;

    /// The current revision of a template, compared against the revision a page
    /// was compiled from
    fn revision(&self, path: &str) -> Option<u64>;

    /// Every template path in the store
    fn list(&self) -> Result<Vec<String>>;
}

/// Templates stored as files below a root directory.
///
/// `views/home/index` maps to `<root>/views/home/index`, or to
/// `<root>/views/home/index.<extension>` when an extension is configured and the
/// bare file doesn't exist.
#[derive(Clone, Debug)]
pub struct FileSystemSource {
    root: PathBuf,
    extension: Option<String>,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemSource { root: root.into(), extension: None }
    }

    /// Lets logical paths omit a file extension, `cshtml` for example
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &str) -> Option<PathBuf> {
        let normalized = normalize_path(path);
        let bare = self.root.join(&normalized);
        if bare.is_file() {
            return Some(bare);
        }
        match self.extension {
            Some(ref ext) => {
                let with_ext = self.root.join(format!("{}.{}", normalized, ext));
                if with_ext.is_file() {
                    Some(with_ext)
                } else {
                    None
                }
            }
            None => None,
        }
    }
}

fn modified_revision(file: &Path) -> Option<u64> {
    let modified = fs::metadata(file).and_then(|m| m.modified()).ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_nanos() as u64)
}

impl TemplateSource for FileSystemSource {
    fn load(&self, path: &str) -> Result<Source> {
        let file = self.file_for(path).ok_or_else(|| Error::template_not_found(path))?;
        let revision = modified_revision(&file);
        let text = fs::read_to_string(&file).map_err(|e| {
            Error::chain(format!("Couldn't read template '{}' from {}", path, file.display()), e)
        })?;
        Ok(Source { text, revision })
    }

    fn exists(&self, path: &str) -> bool {
        self.file_for(path).is_some()
    }

    fn revision(&self, path: &str) -> Option<u64> {
        self.file_for(path).and_then(|file| modified_revision(&file))
    }

    fn list(&self) -> Result<Vec<String>> {
        let root = fs::canonicalize(&self.root).map_err(|e| {
            Error::chain(format!("Template root {} is not readable", self.root.display()), e)
        })?;
        let walker = GlobWalkerBuilder::from_patterns(&root, &["**/*"])
            .follow_links(true)
            .build()
            .map_err(|e| Error::chain(format!("Couldn't walk {}", root.display()), e))?
            .into_iter()
            .filter_map(std::result::Result::ok);

        let mut paths = vec![];
        for entry in walker {
            let file = entry.path();
            if !file.is_file() {
                continue;
            }
            let relative = match file.strip_prefix(&root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let mut logical = normalize_path(&relative.to_string_lossy());
            if let Some(ref ext) = self.extension {
                let suffix = format!(".{}", ext);
                if logical.ends_with(&suffix) {
                    logical.truncate(logical.len() - suffix.len());
                }
            }
            paths.push(logical);
        }
        paths.sort();
        Ok(paths)
    }
}

/// Templates kept in memory. Every insertion bumps the revision of that path.
#[derive(Debug, Default)]
pub struct MemorySource {
    templates: RwLock<HashMap<String, Source>>,
    next_revision: AtomicU64,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Adds or replaces a template
    pub fn insert(&self, path: &str, text: impl Into<String>) {
        let revision = self.next_revision.fetch_add(1, Ordering::Relaxed);
        let source = Source { text: text.into(), revision: Some(revision) };
        self.templates.write().insert(normalize_path(path), source);
    }

    /// Builds a source from `(path, text)` pairs
    pub fn from_templates<'t, I>(templates: I) -> Self
    where
        I: IntoIterator<Item = (&'t str, &'t str)>,
    {
        let source = MemorySource::new();
        for (path, text) in templates {
            source.insert(path, text);
        }
        source
    }

    /// Removes a template, returning whether it existed
    pub fn remove(&self, path: &str) -> bool {
        self.templates.write().remove(&normalize_path(path)).is_some()
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, path: &str) -> Result<Source> {
        self.templates
            .read()
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| Error::template_not_found(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.templates.read().contains_key(&normalize_path(path))
    }

    fn revision(&self, path: &str) -> Option<u64> {
        self.templates.read().get(&normalize_path(path)).and_then(|s| s.revision)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self.templates.read().keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}
