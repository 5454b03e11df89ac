//! Directive resolution - expands layouts, includes and components into composed text

use std::borrow::Cow;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::store::TemplateStore;

use super::scanner::DirectiveScanner;

/// Placeholder inside a component template replaced by the tag body
pub const SLOT: &str = "@slot";

/// Resolves directives against a template store
///
/// Passes run in a fixed order (layout, include, component) and each runs
/// once per call, so a layout that itself declares `@layout(...)` or a
/// component nested inside a component body is expanded by one level only.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'v> {
    store: &'v TemplateStore,
    config: &'v ViewConfig,
}

impl<'v> Resolver<'v> {
    pub fn new(store: &'v TemplateStore, config: &'v ViewConfig) -> Self {
        Self { store, config }
    }

    /// Compose raw template text; `template` names it in errors
    pub fn resolve(&self, template: &str, raw: &str) -> Result<String, ViewError> {
        let text = self.resolve_layout(template, raw)?;
        let text = self.resolve_includes(template, &text)?;
        self.resolve_components(template, &text)
    }

    /// Replace a child template with its layout, filling `@child` placeholders
    ///
    /// Only text inside `@section ... @end` blocks of the child survives.
    /// Children are filled one after another, so a section body holding a
    /// placeholder of a later child gets that placeholder filled as well.
    pub fn resolve_layout(&self, template: &str, raw: &str) -> Result<String, ViewError> {
        let scanner = DirectiveScanner::new(raw);
        let Some(layout) = scanner.layout() else {
            return Ok(raw.to_string());
        };

        let base = self.fetch(template, scanner.slice(&layout.span), &layout.node)?;
        let children = DirectiveScanner::new(&base).children();
        tracing::debug!(
            template,
            layout = %layout.node,
            children = children.len(),
            "resolving layout"
        );

        let mut composed = base.into_owned();
        for child in &children {
            let body = scanner.section(&child.node).unwrap_or_else(|| {
                tracing::trace!(template, child = %child.node, "no section for child");
                ""
            });
            composed = composed
                .replace(&format!("@child(\"{}\")", child.node), body)
                .replace(&format!("@child('{}')", child.node), body);
        }
        Ok(composed)
    }

    /// Inline the raw text of every `@include` found in `text`
    ///
    /// Each directive replaces all of its remaining occurrences in turn, so
    /// included text is expanded only where it repeats a directive of the
    /// first scan.
    pub fn resolve_includes(&self, template: &str, text: &str) -> Result<String, ViewError> {
        let scanner = DirectiveScanner::new(text);
        let includes = scanner.includes();
        if includes.is_empty() {
            return Ok(text.to_string());
        }
        tracing::debug!(template, includes = includes.len(), "resolving includes");

        let mut composed = text.to_string();
        for include in &includes {
            let directive = scanner.slice(&include.span);
            if !composed.contains(directive) {
                continue;
            }
            let content = self.fetch(template, directive, &include.node)?;
            composed = composed.replace(directive, &content);
        }
        Ok(composed)
    }

    /// Expand `<x-NAME>` tags with `componentsDir/NAME.extension`
    ///
    /// Every copy of a tag's exact text is replaced by its expansion.
    pub fn resolve_components(&self, template: &str, text: &str) -> Result<String, ViewError> {
        let scanner = DirectiveScanner::new(text);
        let components = scanner.components();
        if components.is_empty() {
            return Ok(text.to_string());
        }
        tracing::debug!(template, components = components.len(), "resolving components");

        let mut composed = text.to_string();
        for component in &components {
            let whole = scanner.slice(&component.span);
            if !composed.contains(whole) {
                continue;
            }
            let name = self.config.component_name(&component.node.name);
            let tag = format!("<x-{}>", component.node.name);
            let source = self.fetch(template, &tag, &name)?;
            let body = scanner.slice(&component.node.body);
            composed = composed.replace(whole, &source.replace(SLOT, body));
        }
        Ok(composed)
    }

    fn fetch(
        &self,
        template: &str,
        directive: &str,
        name: &str,
    ) -> Result<Cow<'v, str>, ViewError> {
        self.store
            .get(name)
            .map_err(|e| ViewError::directive(template, directive, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store(templates: &[(&str, &str)]) -> TemplateStore {
        TemplateStore::with_templates(
            "views",
            "html",
            templates
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn resolve(templates: &[(&str, &str)], raw: &str) -> String {
        let store = store(templates);
        let config = ViewConfig::default();
        Resolver::new(&store, &config)
            .resolve("test.html", raw)
            .expect("should resolve")
    }

    #[test]
    fn test_no_directives_is_identity() {
        let raw = "<p>Hello {{ .Name }}, mail me @ home</p>";
        assert_eq!(resolve(&[("x.html", "x")], raw), raw);
    }

    #[test]
    fn test_layout_fills_children() {
        let out = resolve(
            &[("layout", "This @child('content') is in the layout")],
            "@layout('layout') @section('content') part @end",
        );
        assert_eq!(out, "This  part  is in the layout");
    }

    #[test]
    fn test_layout_child_both_quote_styles() {
        let out = resolve(
            &[("layout.html", r#"[@child("a")][@child('a')]"#)],
            r#"@layout("layout.html")@section('a')A@end"#,
        );
        assert_eq!(out, "[A][A]");
    }

    #[test]
    fn test_section_body_fills_later_child() {
        let out = resolve(
            &[("layout.html", "@child('a')|@child(\"b\")")],
            "@layout('layout.html')@section('a')[@child('b')]@end@section('b')B@end",
        );
        assert_eq!(out, "[B]|B");
    }

    #[test]
    fn test_unmatched_child_is_empty() {
        let out = resolve(
            &[("layout.html", "<main>@child('body')</main><aside>@child(\"side\")</aside>")],
            "@layout('layout.html')@section('body')B@end",
        );
        assert_eq!(out, "<main>B</main><aside></aside>");
    }

    #[test]
    fn test_layout_discards_text_outside_sections() {
        let out = resolve(
            &[("layout.html", "@child('a')")],
            "@layout('layout.html') lost @section('a')kept@end lost",
        );
        assert_eq!(out, "kept");
    }

    #[test]
    fn test_layout_is_single_level() {
        let out = resolve(
            &[
                ("outer.html", "OUTER"),
                ("inner.html", "@layout('outer.html')<@child('a')>"),
            ],
            "@layout('inner.html')@section('a')A@end",
        );
        assert_eq!(out, "@layout('outer.html')<A>");
    }

    #[test]
    fn test_include_quote_styles_match() {
        let templates = [("partial.html", "This is an include")];
        assert_eq!(
            resolve(&templates, "@include('partial.html')"),
            resolve(&templates, "@include(\"partial.html\")")
        );
        assert_eq!(resolve(&templates, "@include('partial.html')"), "This is an include");
    }

    #[test]
    fn test_repeated_includes_all_replaced() {
        let out = resolve(
            &[("hr.html", "<hr>")],
            "a@include('hr.html')b@include('hr.html')c",
        );
        assert_eq!(out, "a<hr>b<hr>c");
    }

    #[test]
    fn test_included_text_expands_directives_of_first_scan() {
        let templates = [("a.html", "[@include('b.html')]"), ("b.html", "B")];
        assert_eq!(
            resolve(&templates, "@include('a.html')@include('b.html')"),
            "[B]B"
        );
        assert_eq!(
            resolve(&templates, "@include('a.html')"),
            "[@include('b.html')]"
        );
    }

    #[test]
    fn test_included_component_is_expanded() {
        let out = resolve(
            &[
                ("nav.html", "<x-link>Home</x-link>"),
                ("components/link.html", "<a>@slot</a>"),
            ],
            "@include('nav.html')",
        );
        assert_eq!(out, "<a>Home</a>");
    }

    #[test]
    fn test_component_without_slot_drops_body() {
        let out = resolve(
            &[("components/component.html", "This is a component")],
            "<x-component>hello</x-component>",
        );
        assert_eq!(out, "This is a component");
    }

    #[test]
    fn test_identical_component_tags_share_expansion() {
        let templates = [
            ("components/icon.html", "I"),
            ("components/card.html", "<div>@slot</div>"),
        ];
        assert_eq!(
            resolve(&templates, "<x-icon>a</x-icon> and <x-icon>a</x-icon>"),
            "I and I"
        );
        // The nested copy matches the later top-level tag text
        assert_eq!(
            resolve(&templates, "<x-card><x-icon></x-icon></x-card>|<x-icon></x-icon>"),
            "<div>I</div>|I"
        );
    }

    #[test]
    fn test_every_slot_replaced() {
        let out = resolve(
            &[("components/twice.html", "@slot and @slot")],
            "<x-twice class=\"c\">hi</x-twice>",
        );
        assert_eq!(out, "hi and hi");
    }

    #[test]
    fn test_mismatched_component_tags_are_literal() {
        let raw = "<x-card>hi</x-button>";
        assert_eq!(resolve(&[("components/card.html", "CARD")], raw), raw);
    }

    #[test]
    fn test_nested_component_one_level() {
        let out = resolve(
            &[
                ("components/card.html", "<div>@slot</div>"),
                ("components/button.html", "<button>@slot</button>"),
            ],
            "<x-card><x-button>Go</x-button></x-card>",
        );
        assert_eq!(out, "<div><x-button>Go</x-button></div>");
    }

    #[test]
    fn test_resolve_is_noop_on_composed_text() {
        let templates = [
            ("layout.html", "<body>@child('main')</body>"),
            ("components/b.html", "<b>@slot</b>"),
        ];
        let once = resolve(
            &templates,
            "@layout('layout.html')@section('main')<x-b>bold</x-b>@end",
        );
        assert_eq!(once, "<body><b>bold</b></body>");
        assert_eq!(resolve(&templates, &once), once);
    }

    #[test]
    fn test_missing_include_reports_directive() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "html");
        let config = ViewConfig::default();
        let err = Resolver::new(&store, &config)
            .resolve("page.html", "before @include('gone.html') after")
            .unwrap_err();
        match err {
            ViewError::Directive {
                template,
                directive,
                source,
            } => {
                assert_eq!(template, "page.html");
                assert_eq!(directive, "@include('gone.html')");
                assert!(matches!(*source, ViewError::TemplateNotFound { .. }));
            }
            other => panic!("Expected Directive error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_component_reports_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "html");
        let config = ViewConfig::default();
        let err = Resolver::new(&store, &config)
            .resolve("page.html", "<x-ghost>boo</x-ghost>")
            .unwrap_err();
        assert!(matches!(err, ViewError::Directive { ref directive, .. } if directive == "<x-ghost>"));
    }
}
