//! Directive grammar and resolution
//!
//! Templates compose through four directive kinds:
//!
//! ```text
//! @layout("layouts/app.html")          extend a layout
//! @section("content") ... @end         fill a layout placeholder
//! @child("content")                    placeholder inside the layout
//! @include("partials/nav.html")        inline another template's raw text
//! <x-alert type="warn">Body</x-alert>  component, body replaces @slot
//! ```
//!
//! The [`lexer`] splits text into directive tokens and literal text, the
//! [`DirectiveScanner`] pairs them into [`Spanned`] occurrences and the
//! [`Resolver`] substitutes them pass by pass.

pub mod ast;
pub mod lexer;
mod resolver;
mod scanner;

pub use ast::{Component, Directive, Section, Spanned};
pub use resolver::{Resolver, SLOT};
pub use scanner::DirectiveScanner;
