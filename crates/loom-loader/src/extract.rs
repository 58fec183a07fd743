// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Splits component documents into style, template and script.

use scraper::{ElementRef, Html, Selector};

use crate::path::ModuleKind;

/// Script used when a component has no `<script>` element.
pub const EMPTY_SCRIPT: &str = "export default {}";

/// The parts of a component document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFragments {
    /// Content of the first `<style>`
    pub style: String,
    /// Inner markup of the first `<template>`
    pub template: String,
    /// Content of the first `<script>`
    pub script: String,
}

/// HTML fragment parsing capability.
pub trait FragmentParser: Send + Sync {
    /// Content of the first top-level element for each of `tags`, in
    /// order. Raw text elements (`script`, `style`) yield their unescaped
    /// text; others yield inner HTML. Elements inside a `<template>` are
    /// never matched.
    fn first_elements(&self, text: &str, tags: &[&str]) -> Vec<Option<String>>;
}

/// [`FragmentParser`] backed by `scraper` (html5ever).
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlFragmentParser;

impl FragmentParser for HtmlFragmentParser {
    fn first_elements(&self, text: &str, tags: &[&str]) -> Vec<Option<String>> {
        let fragment = Html::parse_fragment(text);
        tags.iter()
            .map(|tag| {
                let selector = Selector::parse(tag).ok()?;
                let element = fragment
                    .select(&selector)
                    .find(|element| !inside_template(element))?;
                Some(match *tag {
                    "script" | "style" => element.text().collect::<String>(),
                    _ => element.inner_html(),
                })
            })
            .collect()
    }
}

fn inside_template(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|ancestor| ancestor.name() == "template")
}

/// Extracts the fragments of a document of the given kind.
///
/// Extraction never fails: missing parts default to empty strings (and to
/// [`EMPTY_SCRIPT`] for the script). Script modules are not parsed at all.
pub fn extract(parser: &dyn FragmentParser, kind: ModuleKind, text: &str) -> ComponentFragments {
    if kind == ModuleKind::Script {
        return ComponentFragments {
            script: text.to_string(),
            ..Default::default()
        };
    }

    let mut parts = parser
        .first_elements(text, &["style", "template", "script"])
        .into_iter();
    let mut next = || parts.next().flatten();
    let style = next().unwrap_or_default();
    let template = next().unwrap_or_default();
    let script = next().unwrap_or_else(|| EMPTY_SCRIPT.to_string());

    ComponentFragments {
        style,
        template,
        script,
    }
}
