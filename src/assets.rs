//! Vite asset manifest lookup
//!
//! In development the Vite dev server serves sources directly, so
//! [`AssetManifest::asset`] first checks it and returns the dev URL when the
//! server answers. Otherwise the hashed build file from `manifest.json` is
//! used.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AssetConfig;

const CHECK_TIMEOUT: Duration = Duration::from_millis(500);

/// One entry of a Vite `manifest.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default, rename = "isEntry")]
    pub is_entry: bool,
    #[serde(default)]
    pub css: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

/// Loaded manifest plus the dev-server settings used to resolve asset URLs
#[derive(Debug, Clone)]
pub struct AssetManifest {
    build_path: String,
    dev_server_url: Option<String>,
    entries: HashMap<String, ManifestEntry>,
    client: Option<Client>,
}

impl AssetManifest {
    /// Read `{build_path}/manifest.json`
    ///
    /// A missing or malformed manifest is logged and treated as empty.
    pub fn load(config: &AssetConfig) -> Self {
        let path = Path::new(&config.build_path).join("manifest.json");
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid asset manifest");
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "asset manifest not readable");
                HashMap::new()
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded asset manifest");
        Self::from_entries(config, entries)
    }

    /// Build a manifest from entries already in memory
    pub fn from_entries(config: &AssetConfig, entries: HashMap<String, ManifestEntry>) -> Self {
        let client = config.dev_server_url.as_ref().and_then(|_| {
            Client::builder()
                .timeout(CHECK_TIMEOUT)
                .build()
                .map_err(|e| tracing::warn!(error = %e, "cannot create dev server client"))
                .ok()
        });
        Self {
            build_path: config.build_path.clone(),
            dev_server_url: config.dev_server_url.clone(),
            entries,
            client,
        }
    }

    /// Public URL for a source asset such as `src/main.js`
    ///
    /// Returns `{dev_server_url}/{path}` when the dev server answers `200`,
    /// else `/{build_path}/{file}` from the manifest. An unknown path yields
    /// an empty file component.
    pub fn asset(&self, path: &str) -> String {
        if let Some(url) = self.dev_url(path) {
            if self.dev_server_serves(&url) {
                return url;
            }
        }
        let file = self.entries.get(path).map_or("", |entry| entry.file.as_str());
        format!("/{}/{}", self.build_path, file)
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn dev_url(&self, path: &str) -> Option<String> {
        self.dev_server_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), path))
    }

    fn dev_server_serves(&self, url: &str) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        match client.get(url).send() {
            Ok(response) => {
                tracing::debug!(url, status = %response.status(), "dev server check");
                response.status() == StatusCode::OK
            }
            Err(e) => {
                tracing::trace!(url, error = %e, "dev server unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn entries() -> HashMap<String, ManifestEntry> {
        HashMap::from([(
            "src/main.js".to_string(),
            ManifestEntry {
                file: "assets/main.4f2a.js".to_string(),
                src: Some("src/main.js".to_string()),
                is_entry: true,
                ..Default::default()
            },
        )])
    }

    /// Answers a single request with `status` and returns the server URL
    fn serve_once(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_build_file_without_dev_server() {
        let config = AssetConfig::new()
            .with_build_path("static/build")
            .with_dev_server_url(None);
        let manifest = AssetManifest::from_entries(&config, entries());
        assert_eq!(manifest.asset("src/main.js"), "/static/build/assets/main.4f2a.js");
        assert_eq!(manifest.asset("src/other.js"), "/static/build/");
    }

    #[test]
    fn test_dev_server_url_when_reachable() {
        let url = serve_once("200 OK");
        let config = AssetConfig::new().with_dev_server_url(Some(url.clone()));
        let manifest = AssetManifest::from_entries(&config, entries());
        assert_eq!(manifest.asset("src/main.js"), format!("{}/src/main.js", url));
    }

    #[test]
    fn test_dev_server_non_200_falls_back() {
        let url = serve_once("404 Not Found");
        let config = AssetConfig::new()
            .with_build_path("build")
            .with_dev_server_url(Some(url));
        let manifest = AssetManifest::from_entries(&config, entries());
        assert_eq!(manifest.asset("src/main.js"), "/build/assets/main.4f2a.js");
    }

    #[test]
    fn test_unreachable_dev_server_falls_back() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let config = AssetConfig::new()
            .with_build_path("build")
            .with_dev_server_url(Some(format!("http://{}", addr)));
        let manifest = AssetManifest::from_entries(&config, entries());
        assert_eq!(manifest.asset("src/main.js"), "/build/assets/main.4f2a.js");
    }

    #[test]
    fn test_load_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("manifest.json"),
            r#"{"src/app.css": {"file": "assets/app.9c.css", "src": "src/app.css"}}"#,
        )
        .unwrap();
        let config = AssetConfig::new()
            .with_build_path(dir.path().to_string_lossy())
            .with_dev_server_url(None);
        let manifest = AssetManifest::load(&config);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entry("src/app.css").unwrap().file, "assets/app.9c.css");
        assert!(!manifest.entry("src/app.css").unwrap().is_entry);
    }

    #[test]
    fn test_missing_or_invalid_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetConfig::new()
            .with_build_path(dir.path().to_string_lossy())
            .with_dev_server_url(None);
        assert!(AssetManifest::load(&config).is_empty());

        std::fs::write(dir.path().join("manifest.json"), "not json").unwrap();
        assert!(AssetManifest::load(&config).is_empty());
    }
}
