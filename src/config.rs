//! Configuration for views and assets
//!
//! Both configs can be built in code with the `with_*` builders or read from a
//! TOML file:
//!
//! ```toml
//! [views]
//! base_dir = "resources/views"
//! extension = "html"
//! components_dir = "components"
//!
//! [assets]
//! build_path = "static/build"
//! dev_server_url = "http://localhost:5173"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration for a [`View`](crate::View)
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Root directory of the template tree
    pub base_dir: PathBuf,
    /// File extension of template files, without the dot
    pub extension: String,
    /// Subdirectory of `base_dir` holding `<x-NAME>` component templates
    pub components_dir: String,
    /// Pre-loaded templates; when non-empty the store never reads from disk
    pub templates: HashMap<String, String>,
    /// HTML-escape values written by `{{ ... }}` placeholders
    pub escape_html: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("resources/views"),
            extension: "html".to_string(),
            components_dir: "components".to_string(),
            templates: HashMap::new(),
            escape_html: true,
        }
    }
}

/// Configuration for [`AssetManifest`](crate::AssetManifest)
#[derive(Debug, Clone, PartialEq)]
pub struct AssetConfig {
    /// Directory holding the build output and `manifest.json`
    pub build_path: String,
    /// Dev server checked before falling back to the manifest; `None` disables the check
    pub dev_server_url: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            build_path: "static/build".to_string(),
            dev_server_url: Some("http://localhost:5173".to_string()),
        }
    }
}

/// TOML structure for deserializing config files
#[derive(Deserialize, Default)]
struct TomlConfig {
    views: Option<TomlViews>,
    assets: Option<TomlAssets>,
}

#[derive(Deserialize)]
struct TomlViews {
    base_dir: Option<PathBuf>,
    extension: Option<String>,
    components_dir: Option<String>,
    escape_html: Option<bool>,
}

#[derive(Deserialize)]
struct TomlAssets {
    build_path: Option<String>,
    dev_server_url: Option<String>,
}

impl ViewConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `[views]` table from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load the `[views]` table from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(views) = parsed.views {
            if let Some(base_dir) = views.base_dir {
                config.base_dir = base_dir;
            }
            if let Some(extension) = views.extension {
                config.extension = extension;
            }
            if let Some(components_dir) = views.components_dir {
                config.components_dir = components_dir;
            }
            if let Some(escape_html) = views.escape_html {
                config.escape_html = escape_html;
            }
        }
        Ok(config)
    }

    /// Set the template root directory
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the template file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the components subdirectory
    pub fn with_components_dir(mut self, components_dir: impl Into<String>) -> Self {
        self.components_dir = components_dir.into();
        self
    }

    /// Add a pre-loaded template
    pub fn with_template(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(name.into(), text.into());
        self
    }

    /// Replace the pre-loaded template mapping
    pub fn with_templates(mut self, templates: HashMap<String, String>) -> Self {
        self.templates = templates;
        self
    }

    /// Enable or disable HTML escaping of substituted values
    pub fn with_escape_html(mut self, escape_html: bool) -> Self {
        self.escape_html = escape_html;
        self
    }

    /// Logical name of the template backing `<x-NAME>`
    pub fn component_name(&self, name: &str) -> String {
        format!("{}/{}.{}", self.components_dir, name, self.extension)
    }
}

impl AssetConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `[assets]` table from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load the `[assets]` table from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(assets) = parsed.assets {
            if let Some(build_path) = assets.build_path {
                config.build_path = build_path;
            }
            if let Some(url) = assets.dev_server_url {
                config.dev_server_url = if url.is_empty() { None } else { Some(url) };
            }
        }
        Ok(config)
    }

    /// Set the build output directory
    pub fn with_build_path(mut self, build_path: impl Into<String>) -> Self {
        self.build_path = build_path.into();
        self
    }

    /// Set the dev server URL, or `None` to never check it
    pub fn with_dev_server_url(mut self, url: Option<String>) -> Self {
        self.dev_server_url = url;
        self
    }
}
