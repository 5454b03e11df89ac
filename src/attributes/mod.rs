//! HTML attribute extraction for component tags

mod lexer;

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

use crate::error::ViewError;

/// Attributes of the first element inside `<body>` of `markup`
///
/// The markup is parsed as a full document, so a bare fragment such as
/// `<x-card title="Hi">...</x-card>` ends up as the first body element.
/// Attributes are then read from that element's opening tag in source order;
/// when a name repeats, the last value wins.
pub fn extract_attributes(markup: &str) -> Result<HashMap<String, String>, ViewError> {
    let document = Html::parse_document(markup);
    let body_selector = Selector::parse("body").map_err(|e| ViewError::Markup {
        message: e.to_string(),
    })?;

    let element = document
        .select(&body_selector)
        .next()
        .and_then(|body| body.children().find_map(ElementRef::wrap))
        .ok_or_else(|| ViewError::Markup {
            message: "no element found in body".to_string(),
        })?;

    let name = element.value().name();
    let ordinal = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == name)
        .position(|e| e.id() == element.id());
    if let Some(pairs) = ordinal.and_then(|k| lexer::tag_attributes(markup, name, k)) {
        let mut attrs = HashMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            attrs.insert(key, value);
        }
        return Ok(attrs);
    }

    tracing::trace!(element = name, "opening tag not in source, using parsed attributes");
    Ok(element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}
