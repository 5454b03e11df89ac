//! View Composer - Blade-style template composition
//!
//! Templates compose through `@layout`/`@section`/`@child`, `@include` and
//! `<x-component>` directives, then `{{ ... }}` actions are substituted from a
//! JSON data context.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use view_composer::{View, ViewConfig};
//!
//! let config = ViewConfig::new()
//!     .with_template("layout.html", "<h1>@child('title')</h1>")
//!     .with_template(
//!         "home.html",
//!         "@layout('layout.html') @section('title')Hello {{ .Name }}@end",
//!     );
//! let view = View::new(config);
//!
//! let html = view.render("home.html", &json!({"Name": "Saeed"})).unwrap();
//! assert_eq!(html, "<h1>Hello Saeed</h1>");
//! ```

pub mod assets;
pub mod attributes;
pub mod config;
pub mod directive;
pub mod error;
pub mod executor;
pub mod store;
pub mod view;

pub use assets::{AssetManifest, ManifestEntry};
pub use attributes::extract_attributes;
pub use config::{AssetConfig, ConfigError, ViewConfig};
pub use directive::{DirectiveScanner, Resolver};
pub use error::{EvalError, ParseError, ViewError};
pub use executor::{Function, FunctionError, FunctionTable};
pub use store::TemplateStore;
pub use view::View;

/// Render a template from `views_dir` in one call, reading templates lazily
pub fn render(
    views_dir: impl Into<std::path::PathBuf>,
    name: &str,
    data: &serde_json::Value,
) -> Result<String, ViewError> {
    View::new(ViewConfig::new().with_base_dir(views_dir)).render(name, data)
}
