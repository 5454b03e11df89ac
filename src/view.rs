//! The `View` handle: store, resolver and executor wired together

use serde_json::Value;

use crate::assets::AssetManifest;
use crate::config::ViewConfig;
use crate::directive::Resolver;
use crate::error::ViewError;
use crate::executor::{Executor, FunctionError, FunctionTable};
use crate::store::TemplateStore;

/// A configured view engine
///
/// Every render runs the whole pipeline from raw text: the store supplies the
/// template, the resolver composes layouts, includes and components, and the
/// executor substitutes `{{ ... }}` actions.
#[derive(Debug, Clone)]
pub struct View {
    config: ViewConfig,
    store: TemplateStore,
    functions: FunctionTable,
}

impl Default for View {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl View {
    /// Create a view from its configuration
    ///
    /// Templates listed in the configuration seed the store; with none, templates
    /// are read from disk on demand. The built-in functions are registered.
    pub fn new(config: ViewConfig) -> Self {
        let store = TemplateStore::with_templates(
            config.base_dir.clone(),
            config.extension.clone(),
            config.templates.clone(),
        );
        Self {
            config,
            store,
            functions: FunctionTable::with_builtins(),
        }
    }

    /// Add a table of functions available to every render
    pub fn with_functions(mut self, functions: &FunctionTable) -> Self {
        self.functions = self.functions.merged(functions);
        self
    }

    /// Eagerly load every template under the base directory
    pub fn load(&mut self) -> Result<(), ViewError> {
        self.store.load()
    }

    /// Render a template with the view-wide functions
    pub fn render(&self, name: &str, data: &Value) -> Result<String, ViewError> {
        self.render_with(name, data, &FunctionTable::new())
    }

    /// Render a template with extra per-call functions
    ///
    /// Per-call functions win over view-wide ones of the same name.
    pub fn render_with(
        &self,
        name: &str,
        data: &Value,
        functions: &FunctionTable,
    ) -> Result<String, ViewError> {
        tracing::debug!(template = name, "rendering view");
        let composed = self.compose(name)?;
        Executor::new(&self.functions, self.config.escape_html).execute(
            name,
            &composed,
            data,
            functions,
        )
    }

    /// Composed text of a template, without executing its actions
    pub fn compose(&self, name: &str) -> Result<String, ViewError> {
        let raw = self.store.get(name)?;
        self.resolve(name, &raw)
    }

    /// Resolve directives in `raw` as if it were the template `name`
    pub fn resolve(&self, name: &str, raw: &str) -> Result<String, ViewError> {
        Resolver::new(&self.store, &self.config).resolve(name, raw)
    }

    /// Register a view-wide function, replacing any of the same name
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name, f);
    }

    /// Register `asset "src/main.js"` backed by a Vite manifest
    pub fn register_asset_function(&mut self, manifest: AssetManifest) {
        self.register_function("asset", move |args| match args {
            [Value::String(path)] => Ok(Value::String(manifest.asset(path))),
            [_] => Err(FunctionError::new("asset expects a string path")),
            _ => Err(FunctionError::arity(1, args.len())),
        });
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }
}
