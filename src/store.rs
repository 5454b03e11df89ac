//! Template store: logical template names mapped to raw template text

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ViewError;

/// In-memory template mapping with an on-demand disk fallback
///
/// A loaded store answers every lookup from memory, and an unknown name is
/// simply empty text. An unloaded store reads `base_dir/name` on each lookup.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    base_dir: PathBuf,
    extension: String,
    templates: HashMap<String, String>,
    loaded: bool,
}

impl TemplateStore {
    /// Create an empty store that reads templates lazily from `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
            templates: HashMap::new(),
            loaded: false,
        }
    }

    /// Create a store seeded with an initial mapping
    ///
    /// A non-empty mapping marks the store as loaded.
    pub fn with_templates(
        base_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        templates: HashMap<String, String>,
    ) -> Self {
        let loaded = !templates.is_empty();
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
            templates,
            loaded,
        }
    }

    /// Walk `base_dir` and load every file ending with the extension
    pub fn load(&mut self) -> Result<(), ViewError> {
        let mut count = 0;
        for entry in WalkDir::new(&self.base_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| ViewError::Walk {
                path: self.base_dir.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !entry.file_name().to_string_lossy().ends_with(&self.extension) {
                continue;
            }

            let name = self.logical_name(entry.path());
            let content = std::fs::read_to_string(entry.path()).map_err(|source| {
                ViewError::Io {
                    name: name.clone(),
                    source,
                }
            })?;
            tracing::trace!(template = %name, bytes = content.len(), "loaded template");
            self.templates.insert(name, content);
            count += 1;
        }

        tracing::debug!(
            base_dir = %self.base_dir.display(),
            count,
            "template store loaded"
        );
        self.loaded = true;
        Ok(())
    }

    /// Raw text for a template name
    pub fn get(&self, name: &str) -> Result<Cow<'_, str>, ViewError> {
        if self.loaded {
            return Ok(self
                .templates
                .get(name)
                .map(|s| Cow::Borrowed(s.as_str()))
                .unwrap_or_default());
        }

        let path = self.base_dir.join(name);
        tracing::trace!(template = name, path = %path.display(), "reading template from disk");
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Cow::Owned(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ViewError::TemplateNotFound {
                name: name.to_string(),
                path,
            }),
            Err(source) => Err(ViewError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Add or replace a template
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(name.into(), text.into());
    }

    /// Check whether a template is held in memory
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Names of all in-memory templates
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Whether lookups are answered from memory only
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path relative to `base_dir`, joined with `/` on every platform
    fn logical_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_loaded_store_missing_key_is_empty() {
        let mut templates = HashMap::new();
        templates.insert("home.html".to_string(), "Home".to_string());
        let store = TemplateStore::with_templates("views", "html", templates);

        assert!(store.is_loaded());
        assert_eq!(store.get("home.html").unwrap(), "Home");
        assert_eq!(store.get("missing.html").unwrap(), "");
    }

    #[test]
    fn test_empty_mapping_stays_lazy() {
        let store = TemplateStore::with_templates("views", "html", HashMap::new());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_lazy_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "html");
        let err = store.get("nope.html").unwrap_err();
        assert!(matches!(err, ViewError::TemplateNotFound { ref name, .. } if name == "nope.html"));
    }

    #[test]
    fn test_lazy_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "Lazy content").unwrap();
        let store = TemplateStore::new(dir.path(), "html");
        assert_eq!(store.get("page.html").unwrap(), "Lazy content");
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_keys_by_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("components/forms")).unwrap();
        std::fs::write(dir.path().join("home.html"), "Home\n").unwrap();
        std::fs::write(dir.path().join("components/forms/input.html"), "<input>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut store = TemplateStore::new(dir.path(), "html");
        store.load().unwrap();

        assert!(store.is_loaded());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("home.html").unwrap(), "Home\n");
        assert_eq!(store.get("components/forms/input.html").unwrap(), "<input>");
        assert!(!store.contains("notes.txt"));
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TemplateStore::new(dir.path().join("absent"), "html");
        assert!(matches!(store.load(), Err(ViewError::Walk { .. })));
    }
}
