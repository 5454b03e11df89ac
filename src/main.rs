//! View Composer CLI
//!
//! Usage:
//!   view-composer [OPTIONS] <NAME>
//!
//! Options:
//!   --views <DIR>         Views directory (default resources/views)
//!   --extension <EXT>     Template file extension (default html)
//!   --components <DIR>    Components subdirectory (default components)
//!   -c, --config <FILE>   TOML configuration with [views] and [assets]
//!   -d, --data <FILE>     JSON data context, `-` reads stdin
//!   --compose             Print composed text without executing actions
//!   --directives          List the directives found in the raw template
//!   --preload             Load every template before rendering
//!   --syntax              Show directive and action syntax reference
//!   -h, --help            Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use view_composer::{AssetConfig, AssetManifest, DirectiveScanner, View, ViewConfig};

#[derive(Parser)]
#[command(name = "view-composer")]
#[command(about = "Compose and render Blade-style view templates")]
struct Cli {
    /// Template name relative to the views directory, e.g. `home.html`
    name: Option<String>,

    /// Views directory
    #[arg(long)]
    views: Option<PathBuf>,

    /// Template file extension
    #[arg(long)]
    extension: Option<String>,

    /// Components subdirectory inside the views directory
    #[arg(long)]
    components: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON data file (`-` for stdin)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print the composed template without executing actions
    #[arg(long)]
    compose: bool,

    /// List directives found in the raw template
    #[arg(long)]
    directives: bool,

    /// Load every template up front instead of reading on demand
    #[arg(long)]
    preload: bool,

    /// Show directive and action syntax reference
    #[arg(long)]
    syntax: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.syntax {
        print_syntax();
        return;
    }

    let Some(name) = cli.name.as_deref() else {
        eprintln!("Error: a template name is required (see --help)");
        std::process::exit(1);
    };

    // Load configuration, then let flags override it
    let (mut config, assets) = match &cli.config {
        Some(path) => {
            let views = ViewConfig::from_file(path);
            let assets = AssetConfig::from_file(path);
            match views.and_then(|v| assets.map(|a| (v, Some(a)))) {
                Ok(loaded) => loaded,
                Err(e) => {
                    eprintln!("Error loading config '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => (ViewConfig::default(), None),
    };
    if let Some(views) = cli.views {
        config = config.with_base_dir(views);
    }
    if let Some(extension) = cli.extension {
        config = config.with_extension(extension);
    }
    if let Some(components) = cli.components {
        config = config.with_components_dir(components);
    }

    let mut view = View::new(config);
    if let Some(assets) = assets {
        view.register_asset_function(AssetManifest::load(&assets));
    }
    if cli.preload {
        if let Err(e) = view.load() {
            eprintln!("Error: {}", e.report());
            std::process::exit(1);
        }
    }

    if cli.directives {
        print_directives(&view, name);
        return;
    }

    let result = if cli.compose {
        view.compose(name)
    } else {
        let data = match &cli.data {
            Some(path) => read_data(path),
            None => Ok(Value::Null),
        };
        match data {
            Ok(data) => view.render(name, &data),
            Err(message) => {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
        }
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e.report());
            std::process::exit(1);
        }
    }
}

/// Read the JSON data context from a file or stdin
fn read_data(path: &Path) -> Result<Value, String> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("reading data from stdin: {}", e))?;
        buffer
    } else {
        fs::read_to_string(path)
            .map_err(|e| format!("reading data file '{}': {}", path.display(), e))?
    };
    serde_json::from_str(&content).map_err(|e| format!("invalid JSON data: {}", e))
}

fn print_directives(view: &View, name: &str) {
    let raw = match view.store().get(name) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: {}", e.report());
            std::process::exit(1);
        }
    };
    let scanner = DirectiveScanner::new(&raw);
    for directive in scanner.directives() {
        println!(
            "{:>5}..{:<5} {:?}",
            directive.span.start, directive.span.end, directive.node
        );
    }
}

fn print_syntax() {
    println!(
        r#"VIEW COMPOSER SYNTAX
====================

DIRECTIVES (resolved in this order, one level per render)
    @layout("layouts/app.html")      Extend a layout; only sections survive
    @section("content") ... @end     Block filling the layout's @child("content")
    @child("content")                Placeholder inside the layout
    @include("partials/nav.html")    Inline another template's raw text
    <x-alert type="warn">Hi</x-alert> Inline components/alert.html, @slot = body

    Single and double quotes are both accepted.

ACTIONS
    {{{{ .Name }}}}                      Field of the JSON data
    {{{{ .User.Tags.0 }}}}               Nested field, numeric segments index arrays
    {{{{ len .Items }}}}                 Function call
    {{{{ .Items | len }}}}               Pipeline, value becomes the last argument
    {{{{ $.Site }}}}                     Field of the render data inside a block
    {{{{ if .A }}}}..{{{{ else if .B }}}}..{{{{ else }}}}..{{{{ end }}}}
    {{{{ range .Items }}}}{{{{ . }}}}{{{{ else }}}}none{{{{ end }}}}
    {{{{ with .User }}}}{{{{ .Name }}}}{{{{ end }}}}  range and with rebind "."
    {{{{- .Name -}}}}                    Trim whitespace around the action
    {{{{/* comment */}}}}

BUILT-IN FUNCTIONS
    print, len, index, json, not, and, or, eq, ne, lt, le, gt, ge,
    asset (with an [assets] config)"#
    );
}
