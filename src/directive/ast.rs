//! Directive occurrences found in template text

pub use super::lexer::Span;

/// A directive with its location in the scanned text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// `@section("name") ... @end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Text between the opening directive and `@end`
    pub body: Span,
}

/// `<x-NAME attrs>BODY</x-NAME>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    /// Opening-tag attribute text, kept opaque
    pub raw_attributes: String,
    /// Text between the opening and closing tags
    pub body: Span,
}

impl Component {
    /// Parse the opening-tag attributes into a name → value map
    pub fn attributes(
        &self,
    ) -> Result<std::collections::HashMap<String, String>, crate::error::ViewError> {
        crate::attributes::extract_attributes(&format!(
            "<x-{} {}></x-{}>",
            self.name, self.raw_attributes, self.name
        ))
    }
}

/// Every directive kind the scanner recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Layout { name: String },
    Child { name: String },
    Include { name: String },
    Section(Section),
    Component(Component),
}
