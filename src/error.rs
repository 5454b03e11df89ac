//! Error types for loading, composing and executing views

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::FunctionError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Malformed `{{ ... }}` expression syntax
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Shift the span by `offset` bytes, used to map an expression-local
    /// error back onto the whole template text.
    pub fn offset(self, offset: usize) -> Self {
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => ParseError::Syntax {
                span: span.start + offset..span.end + offset,
                message,
                expected,
            },
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::executor::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::executor::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", tok.describe()),
                None => "Unexpected end of expression".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(tok.describe()),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of expression".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Failures while evaluating an expression against the data context
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("field '{field}' not found")]
    MissingField { field: String },

    #[error("cannot access field '{field}' on a {found} value")]
    NotAContainer { field: String, found: &'static str },

    #[error("range can't iterate over a {found} value")]
    NotIterable { found: &'static str },

    #[error("function '{name}' is not defined")]
    UnknownFunction { name: String },

    #[error("function '{name}' failed: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },
}

/// Every failure the view engine reports
#[derive(Error, Debug)]
pub enum ViewError {
    /// Lazy lookup of a template that is not on disk
    #[error("template not found: {name} ({})", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    /// Template file exists but could not be read
    #[error("error reading template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed during an eager load
    #[error("error loading views from {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A template referenced by a directive could not be loaded
    #[error("in template {template}: cannot expand `{directive}`: {source}")]
    Directive {
        template: String,
        directive: String,
        #[source]
        source: Box<ViewError>,
    },

    /// Malformed expression syntax in composed text
    #[error("syntax error in template {template}: {error}")]
    Syntax {
        template: String,
        text: String,
        error: ParseError,
    },

    /// Expression evaluation failed
    #[error("error evaluating `{expression}` in template {template}: {error}")]
    Eval {
        template: String,
        expression: String,
        error: EvalError,
    },

    /// Markup handed to the attribute extractor had no element to inspect
    #[error("invalid markup: {message}")]
    Markup { message: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ViewError {
    pub(crate) fn directive(
        template: impl Into<String>,
        directive: impl Into<String>,
        source: ViewError,
    ) -> Self {
        Self::Directive {
            template: template.into(),
            directive: directive.into(),
            source: Box::new(source),
        }
    }

    /// Name of the template the error was raised in, if known
    pub fn template(&self) -> Option<&str> {
        match self {
            Self::TemplateNotFound { name, .. } | Self::Io { name, .. } => Some(name),
            Self::Directive { template, .. }
            | Self::Syntax { template, .. }
            | Self::Eval { template, .. } => Some(template),
            _ => None,
        }
    }

    /// Human-readable report; syntax errors get an ariadne source excerpt
    pub fn report(&self) -> String {
        match self {
            Self::Syntax {
                template,
                text,
                error,
            } => error.format(text, template),
            other => other.to_string(),
        }
    }
}
