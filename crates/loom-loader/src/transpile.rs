// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module syntax rewriting.
//!
//! Component scripts are written with `import`/`export` statements. The
//! interpreter has no module system, so each statement is rewritten in
//! place, using token spans from the script lexer:
//!
//! ```text
//! import Button from './button.component';   const Button = await __loader.load("/app/button.component");
//! import { a, b as c } from '../util';        const { a, b: c } = await __loader.load("/util.js");
//! import './side-effect.js';                  (removed)
//! export default { ... }                      return { ... }
//! export const a = 1;                         const a = 1;   ...   return { a };
//! ```
//!
//! The rewritten body is wrapped in an async factory taking the loader
//! handle as its only parameter; see [`TranspiledSource::wrapped`].

use loom_script::lexer::{Scanner, Span, Token, TokenKind};
use std::fmt;

use crate::config::ErrorPolicy;
use crate::path::{normalize, ModulePath, PathStyle};

/// Name of the factory parameter.
pub const LOADER_PARAM: &str = "__loader";

/// Local holding the default payload when named exports also exist.
pub const DEFAULT_LOCAL: &str = "__default";

/// A transpilation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileError {
    /// What went wrong
    pub message: String,
    /// Byte offset into the script
    pub offset: usize,
}

impl fmt::Display for TranspileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

impl std::error::Error for TranspileError {}

/// Something suspicious that did not stop transpilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranspileWarning {
    /// Both `export default` and named exports; the default payload is
    /// returned under the `default` key of the export record.
    MixedExports {
        /// Module path
        path: ModulePath,
    },
}

impl fmt::Display for TranspileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranspileWarning::MixedExports { path } => write!(
                f,
                "{} mixes `export default` with named exports; the default is exported as `default`",
                path
            ),
        }
    }
}

/// A resolved import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// The specifier as written
    pub specifier: String,
    /// Canonical path of the imported module
    pub path: ModulePath,
}

/// Result of [`Transpiler::transpile`].
#[derive(Debug, Clone)]
pub struct TranspiledSource {
    /// The module being transpiled
    pub path: ModulePath,
    /// Rewritten script body
    pub body: String,
    /// Imports, in source order
    pub imports: Vec<ImportRecord>,
    /// Exported names, in declaration order
    pub exports: Vec<String>,
    /// Non-fatal findings
    pub warnings: Vec<TranspileWarning>,
}

impl TranspiledSource {
    /// Factory source: an async function of the loader handle whose body
    /// runs inside a guard that routes errors to `handleError`.
    pub fn wrapped(&self, policy: ErrorPolicy) -> String {
        let rethrow = match policy {
            ErrorPolicy::Propagate => "\nthrow e;",
            ErrorPolicy::Isolate => "",
        };
        format!(
            "async ({param}) => {{\ntry {{\n{body}\n}} catch (e) {{\n{param}.handleError(e);{rethrow}\n}}\n}}",
            param = LOADER_PARAM,
            body = self.body,
            rethrow = rethrow,
        )
    }

    /// Distinct import paths, in first-seen order.
    pub fn import_paths(&self) -> Vec<ModulePath> {
        let mut paths: Vec<ModulePath> = Vec::new();
        for import in &self.imports {
            if !paths.contains(&import.path) {
                paths.push(import.path.clone());
            }
        }
        paths
    }
}

/// Rewrites module syntax into loader calls.
#[derive(Debug, Clone)]
pub struct Transpiler {
    style: PathStyle,
    default_extension: String,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new(PathStyle::Absolute, "js")
    }
}

struct Edit {
    span: Span,
    text: String,
}

struct ExportEntry {
    exported: String,
    local: String,
}

impl Transpiler {
    /// Create a transpiler producing `style` paths; extensionless import
    /// paths get `default_extension`.
    pub fn new(style: PathStyle, default_extension: impl Into<String>) -> Self {
        Self {
            style,
            default_extension: default_extension.into(),
        }
    }

    /// Resolves an import specifier written in `current`.
    pub fn resolve_specifier(&self, specifier: &str, current: &ModulePath) -> ModulePath {
        normalize(specifier, &current.dir_stack(), self.style)
            .with_default_extension(&self.default_extension)
    }

    /// Rewrite `script`, the script of the module at `current`.
    pub fn transpile(
        &self,
        current: &ModulePath,
        script: &str,
    ) -> Result<TranspiledSource, TranspileError> {
        let mut scan = ModuleScan {
            transpiler: self,
            current,
            source: script,
            tokens: Scanner::new(script).collect(),
            edits: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            default_export: None,
        };
        scan.run()?;

        let ModuleScan {
            mut edits,
            imports,
            exports,
            default_export,
            ..
        } = scan;

        let mut warnings = Vec::new();
        let mixed = default_export.is_some() && !exports.is_empty();
        if let Some(index) = default_export {
            if mixed {
                edits[index].text = format!("const {} = ", DEFAULT_LOCAL);
                warnings.push(TranspileWarning::MixedExports {
                    path: current.clone(),
                });
            }
        }

        let mut body = apply_edits(script, edits).trim().to_string();
        if !exports.is_empty() {
            let mut fields: Vec<String> = exports
                .iter()
                .map(|entry| {
                    if entry.exported == entry.local {
                        entry.local.clone()
                    } else {
                        format!("{}: {}", property_name(&entry.exported), entry.local)
                    }
                })
                .collect();
            if mixed {
                fields.push(format!("default: {}", DEFAULT_LOCAL));
            }
            body.push_str(&format!("\nreturn {{ {} }};", fields.join(", ")));
        }

        Ok(TranspiledSource {
            path: current.clone(),
            body,
            imports,
            exports: exports.into_iter().map(|entry| entry.exported).collect(),
            warnings,
        })
    }
}

/// State of one pass over a script's tokens.
struct ModuleScan<'a> {
    transpiler: &'a Transpiler,
    current: &'a ModulePath,
    source: &'a str,
    tokens: Vec<Token>,
    edits: Vec<Edit>,
    imports: Vec<ImportRecord>,
    exports: Vec<ExportEntry>,
    /// Index into `edits` of the `export default` rewrite
    default_export: Option<usize>,
}

impl ModuleScan<'_> {
    fn run(&mut self) -> Result<(), TranspileError> {
        let mut i = 0;
        while i < self.tokens.len() {
            i = match self.tokens[i].kind {
                TokenKind::Import if self.is_statement_keyword(i) => self.import(i)?,
                TokenKind::Export if self.is_statement_keyword(i) => self.export(i)?,
                _ => i + 1,
            };
        }
        Ok(())
    }

    fn kind(&self, i: usize) -> Option<&TokenKind> {
        self.tokens.get(i).map(|t| &t.kind)
    }

    /// `import`/`export` that start a declaration, rather than property
    /// names (`a.import`, `{ export: 1 }`, `{ import }`), `import(...)` or
    /// `import.meta`.
    fn is_statement_keyword(&self, i: usize) -> bool {
        let after_dot = i > 0 && matches!(self.kind(i - 1), Some(TokenKind::Dot | TokenKind::QuestionDot));
        let before = matches!(
            self.kind(i + 1),
            Some(
                TokenKind::LeftParen
                    | TokenKind::Dot
                    | TokenKind::Colon
                    | TokenKind::Comma
                    | TokenKind::RightBrace
            )
        );
        !after_dot && !before
    }

    fn error(&self, i: usize, message: impl Into<String>) -> TranspileError {
        let offset = self
            .tokens
            .get(i)
            .map_or(self.source.len(), |t| t.span.start);
        TranspileError {
            message: message.into(),
            offset,
        }
    }

    fn text(&self, i: usize) -> &str {
        self.tokens[i].span.slice(self.source)
    }

    /// Identifier or keyword spelled at `i`, as a name.
    fn name(&self, i: usize) -> Option<String> {
        match self.kind(i)? {
            TokenKind::Identifier(name) => Some(name.clone()),
            TokenKind::String(name) => Some(name.clone()),
            kind => kind.keyword_text().map(String::from),
        }
    }

    fn binding(&self, i: usize) -> Result<String, TranspileError> {
        match self.kind(i) {
            Some(TokenKind::Identifier(name)) => Ok(name.clone()),
            _ => Err(self.error(i, "expected an identifier")),
        }
    }

    /// End of a statement whose last token is at `last`: swallows a
    /// following `;`.
    fn statement_end(&self, last: usize) -> (usize, usize) {
        if matches!(self.kind(last + 1), Some(TokenKind::Semicolon)) {
            (last + 2, self.tokens[last + 1].span.end)
        } else {
            (last + 1, self.tokens[last].span.end)
        }
    }

    fn replace(&mut self, start: usize, end: usize, text: String) -> usize {
        self.edits.push(Edit {
            span: Span::new(start, end),
            text,
        });
        self.edits.len() - 1
    }

    fn load_call(&mut self, specifier: &str) -> String {
        let path = self.transpiler.resolve_specifier(specifier, self.current);
        let literal = serde_json::to_string(path.as_str()).unwrap_or_else(|_| format!("{:?}", path.as_str()));
        self.imports.push(ImportRecord {
            specifier: specifier.to_string(),
            path,
        });
        format!("await {}.load({})", LOADER_PARAM, literal)
    }

    fn import(&mut self, start: usize) -> Result<usize, TranspileError> {
        let statement_start = self.tokens[start].span.start;

        // import './side-effect.js';
        if let Some(TokenKind::String(_)) = self.kind(start + 1) {
            let (next, end) = self.statement_end(start + 1);
            self.replace(statement_start, end, String::new());
            return Ok(next);
        }

        let mut i = start + 1;
        let mut default = None;
        let mut namespace = None;
        let mut named = None;

        if let Some(TokenKind::Identifier(name)) = self.kind(i) {
            default = Some(name.clone());
            i += 1;
            if matches!(self.kind(i), Some(TokenKind::Comma)) {
                i += 1;
            }
        }

        match self.kind(i) {
            Some(TokenKind::Star) => {
                if !self.kind(i + 1).is_some_and(|k| k.is_word("as")) {
                    return Err(self.error(i + 1, "expected 'as' after '*' in import"));
                }
                namespace = Some(self.binding(i + 2)?);
                i += 3;
            }
            Some(TokenKind::LeftBrace) => {
                let (pattern, next) = self.import_list(i)?;
                named = Some(pattern);
                i = next;
            }
            _ if default.is_some() => {}
            _ => return Err(self.error(i, "expected an import binding")),
        }

        if !self.kind(i).is_some_and(|k| k.is_word("from")) {
            return Err(self.error(i, "expected 'from' in import"));
        }
        let Some(TokenKind::String(specifier)) = self.kind(i + 1).cloned() else {
            return Err(self.error(i + 1, "expected a module specifier string"));
        };
        let (next, end) = self.statement_end(i + 1);

        let call = self.load_call(&specifier);
        let text = match (default, namespace, named) {
            (Some(default), None, None) => format!("const {} = {};", default, call),
            (None, Some(namespace), None) => format!("const {} = {};", namespace, call),
            (None, None, Some(pattern)) => format!("const {} = {};", pattern, call),
            (Some(default), Some(namespace), None) => {
                format!("const {} = {}; const {} = {};", default, call, namespace, default)
            }
            (Some(default), None, Some(pattern)) => {
                format!("const {} = {}; const {} = {};", default, call, pattern, default)
            }
            _ => return Err(self.error(start, "unsupported import form")),
        };
        self.replace(statement_start, end, text);
        Ok(next)
    }

    /// `{ a, b as c, default as d }` -> `{ a, b: c, default: d }`
    fn import_list(&self, open: usize) -> Result<(String, usize), TranspileError> {
        let mut i = open + 1;
        let mut fields = Vec::new();
        loop {
            match self.kind(i) {
                Some(TokenKind::RightBrace) => break,
                Some(_) => {}
                None => return Err(self.error(i, "unterminated import list")),
            }
            let imported = self
                .name(i)
                .ok_or_else(|| self.error(i, "expected an imported name"))?;
            i += 1;
            if self.kind(i).is_some_and(|k| k.is_word("as")) {
                let local = self.binding(i + 1)?;
                fields.push(format!("{}: {}", property_name(&imported), local));
                i += 2;
            } else {
                if !matches!(self.kind(i - 1), Some(TokenKind::Identifier(_))) {
                    return Err(self.error(i - 1, format!("'{}' must be renamed with 'as'", imported)));
                }
                fields.push(imported);
            }
            match self.kind(i) {
                Some(TokenKind::Comma) => i += 1,
                Some(TokenKind::RightBrace) => {}
                _ => return Err(self.error(i, "expected ',' or '}' in import list")),
            }
        }
        let pattern = if fields.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", fields.join(", "))
        };
        Ok((pattern, i + 1))
    }

    fn export(&mut self, start: usize) -> Result<usize, TranspileError> {
        let export_start = self.tokens[start].span.start;
        let Some(next) = self.tokens.get(start + 1).cloned() else {
            return Err(self.error(start + 1, "expected a declaration after 'export'"));
        };

        match next.kind {
            TokenKind::Default => {
                // Swallow the whitespace after `default` so a line break
                // cannot end the `return` statement.
                let end = self
                    .tokens
                    .get(start + 2)
                    .map_or(next.span.end, |t| t.span.start);
                let edit = self.replace(export_start, end, "return ".to_string());
                if self.default_export.replace(edit).is_some() {
                    return Err(self.error(start, "duplicate 'export default'"));
                }
                Ok(start + 2)
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                self.replace(export_start, next.span.start, String::new());
                let names = self.declared_names(start + 2)?;
                for name in names {
                    self.export_local(name);
                }
                Ok(start + 2)
            }
            TokenKind::Function | TokenKind::Class => {
                self.replace(export_start, next.span.start, String::new());
                let name = self.binding(start + 2)?;
                self.export_local(name);
                Ok(start + 3)
            }
            TokenKind::Async if matches!(self.kind(start + 2), Some(TokenKind::Function)) => {
                self.replace(export_start, next.span.start, String::new());
                let name = self.binding(start + 3)?;
                self.export_local(name);
                Ok(start + 4)
            }
            TokenKind::LeftBrace => self.export_list(start),
            TokenKind::Star => Err(self.error(start + 1, "`export *` is not supported")),
            _ => Err(self.error(start + 1, format!("unexpected '{}' after 'export'", self.text(start + 1)))),
        }
    }

    fn export_local(&mut self, name: String) {
        self.exports.push(ExportEntry {
            exported: name.clone(),
            local: name,
        });
    }

    /// `export { a, b as c }` and `export { a } from './x'`.
    fn export_list(&mut self, start: usize) -> Result<usize, TranspileError> {
        let mut i = start + 2;
        let mut entries = Vec::new();
        loop {
            match self.kind(i) {
                Some(TokenKind::RightBrace) => break,
                Some(_) => {}
                None => return Err(self.error(i, "unterminated export list")),
            }
            let local = self
                .name(i)
                .ok_or_else(|| self.error(i, "expected an exported name"))?;
            i += 1;
            let exported = if self.kind(i).is_some_and(|k| k.is_word("as")) {
                let exported = self
                    .name(i + 1)
                    .ok_or_else(|| self.error(i + 1, "expected a name after 'as'"))?;
                i += 2;
                exported
            } else {
                local.clone()
            };
            entries.push(ExportEntry { exported, local });
            match self.kind(i) {
                Some(TokenKind::Comma) => i += 1,
                Some(TokenKind::RightBrace) => {}
                _ => return Err(self.error(i, "expected ',' or '}' in export list")),
            }
        }

        let statement_start = self.tokens[start].span.start;
        let mut last = i;
        let mut text = String::new();
        if self.kind(i + 1).is_some_and(|k| k.is_word("from")) {
            let Some(TokenKind::String(specifier)) = self.kind(i + 2).cloned() else {
                return Err(self.error(i + 2, "expected a module specifier string"));
            };
            // Re-exports bind through a private local per entry.
            let call = self.load_call(&specifier);
            let index = self.imports.len();
            let module_local = format!("__reexport{}", index);
            text.push_str(&format!("const {} = {};", module_local, call));
            for entry in &mut entries {
                entry.local = format!("{}[{}]", module_local, quote(&entry.local));
            }
            last = i + 2;
        }
        let (next, end) = self.statement_end(last);
        self.replace(statement_start, end, text);
        self.exports.extend(entries);
        Ok(next)
    }

    /// Names bound by the first declarator of `const|let|var` at `i`.
    fn declared_names(&self, i: usize) -> Result<Vec<String>, TranspileError> {
        match self.kind(i) {
            Some(TokenKind::Identifier(name)) => Ok(vec![name.clone()]),
            Some(TokenKind::LeftBrace | TokenKind::LeftBracket) => {
                let mut names = Vec::new();
                self.pattern_names(i, &mut names)?;
                Ok(names)
            }
            _ => Err(self.error(i, "expected a binding after export declaration")),
        }
    }

    /// Collects binding names from the pattern starting at `i`; returns the
    /// index after it.
    fn pattern_names(&self, i: usize, names: &mut Vec<String>) -> Result<usize, TranspileError> {
        match self.kind(i) {
            Some(TokenKind::Identifier(name)) => {
                names.push(name.clone());
                Ok(self.skip_default(i + 1))
            }
            Some(TokenKind::LeftBracket) => {
                let mut i = i + 1;
                loop {
                    match self.kind(i) {
                        Some(TokenKind::RightBracket) => return Ok(self.skip_default(i + 1)),
                        Some(TokenKind::Comma) => i += 1,
                        Some(TokenKind::Ellipsis) => i = self.pattern_names(i + 1, names)?,
                        Some(_) => i = self.pattern_names(i, names)?,
                        None => return Err(self.error(i, "unterminated array pattern")),
                    }
                }
            }
            Some(TokenKind::LeftBrace) => {
                let mut i = i + 1;
                loop {
                    match self.kind(i) {
                        Some(TokenKind::RightBrace) => return Ok(self.skip_default(i + 1)),
                        Some(TokenKind::Comma) => i += 1,
                        Some(TokenKind::Ellipsis) => i = self.pattern_names(i + 1, names)?,
                        Some(TokenKind::LeftBracket) => {
                            // computed key: [expr]: target
                            let close = self.skip_balanced(i);
                            if !matches!(self.kind(close), Some(TokenKind::Colon)) {
                                return Err(self.error(close, "expected ':' after computed key"));
                            }
                            i = self.pattern_names(close + 1, names)?;
                        }
                        Some(_) => {
                            if matches!(self.kind(i + 1), Some(TokenKind::Colon)) {
                                i = self.pattern_names(i + 2, names)?;
                            } else {
                                i = self.pattern_names(i, names)?;
                            }
                        }
                        None => return Err(self.error(i, "unterminated object pattern")),
                    }
                }
            }
            _ => Err(self.error(i, "expected a binding pattern")),
        }
    }

    /// Skips `= default` after a pattern element.
    fn skip_default(&self, i: usize) -> usize {
        if !matches!(self.kind(i), Some(TokenKind::Equal)) {
            return i;
        }
        let mut i = i + 1;
        while let Some(kind) = self.kind(i) {
            match kind {
                TokenKind::Comma | TokenKind::RightBrace | TokenKind::RightBracket => break,
                TokenKind::LeftBrace | TokenKind::LeftBracket | TokenKind::LeftParen => {
                    i = self.skip_balanced(i)
                }
                _ => i += 1,
            }
        }
        i
    }

    /// Index after the bracket that closes the one at `open`.
    fn skip_balanced(&self, open: usize) -> usize {
        let mut depth = 0usize;
        let mut i = open;
        while let Some(kind) = self.kind(i) {
            match kind {
                TokenKind::LeftBrace | TokenKind::LeftBracket | TokenKind::LeftParen => depth += 1,
                TokenKind::RightBrace | TokenKind::RightBracket | TokenKind::RightParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        i
    }
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.span.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.text);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

fn quote(name: &str) -> String {
    serde_json::to_string(name).unwrap_or_else(|_| format!("{:?}", name))
}

fn property_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transpile(path: &str, script: &str) -> TranspiledSource {
        Transpiler::default()
            .transpile(&ModulePath::new(path), script)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_default_import_and_export() {
        let out = transpile(
            "/app/main.component",
            "import Widget from './widget.component';\nexport default { components: { Widget } };",
        );
        assert_eq!(
            out.body,
            "const Widget = await __loader.load(\"/app/widget.component\");\nreturn { components: { Widget } };"
        );
        assert_eq!(out.imports[0].path.as_str(), "/app/widget.component");
        assert!(out.exports.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_named_and_namespace_imports() {
        let out = transpile(
            "/app/pages/list.js",
            "import { a, b as c, default as D } from '../util'\nimport * as ns from '/lib/ns.js';",
        );
        assert_eq!(
            out.body,
            "const { a, b: c, default: D } = await __loader.load(\"/app/util.js\");\nconst ns = await __loader.load(\"/lib/ns.js\");"
        );
    }

    #[test]
    fn test_default_plus_named_import() {
        let out = transpile("/a.js", "import Main, { helper } from './main.js';");
        assert_eq!(
            out.body,
            "const Main = await __loader.load(\"/main.js\"); const { helper } = Main;"
        );
    }

    #[test]
    fn test_bare_import_is_not_rewritten_as_path() {
        let out = transpile("/app/main.component", "import Counter from 'Counter';");
        assert_eq!(out.imports[0].path.as_str(), "Counter");
    }

    #[test]
    fn test_side_effect_import_removed() {
        let out = transpile("/a.js", "import './polyfill.js';\nconst x = 1;");
        assert_eq!(out.body, "const x = 1;");
        assert!(out.imports.is_empty());
    }

    #[test]
    fn test_named_exports_collected_in_order() {
        let out = transpile("/a.js", "export const a = 1;\nexport const b = 2;");
        assert_eq!(out.body, "const a = 1;\nconst b = 2;\nreturn { a, b };");
        assert_eq!(out.exports, vec!["a", "b"]);
    }

    #[test]
    fn test_export_declaration_forms() {
        let out = transpile(
            "/a.js",
            "export function f() {}\nexport async function g() {}\nexport let { x, y: z = 1, ...rest } = obj;\nexport var [p, , q] = list;",
        );
        assert_eq!(out.exports, vec!["f", "g", "x", "z", "rest", "p", "q"]);
        assert!(out.body.starts_with("function f() {}\nasync function g() {}\nlet { x"));
    }

    #[test]
    fn test_export_list() {
        let out = transpile("/a.js", "const a = 1, b = 2;\nexport { a, b as c };");
        assert_eq!(out.body, "const a = 1, b = 2;\nreturn { a, c: b };");
        assert_eq!(out.exports, vec!["a", "c"]);
    }

    #[test]
    fn test_re_export() {
        let out = transpile("/app/index.js", "export { x as y } from './x.js';");
        assert_eq!(
            out.body,
            "const __reexport1 = await __loader.load(\"/app/x.js\");\nreturn { y: __reexport1[\"x\"] };"
        );
    }

    #[test]
    fn test_mixed_exports_merge_default() {
        let out = transpile("/a.js", "export const a = 1;\nexport default { b: 2 };");
        assert_eq!(
            out.body,
            "const a = 1;\nconst __default = { b: 2 };\nreturn { a, default: __default };"
        );
        assert!(matches!(out.warnings[0], TranspileWarning::MixedExports { .. }));
    }

    #[test]
    fn test_lookalikes_in_strings_and_comments_untouched() {
        let script = "// import x from './nope';\nconst s = 'export default 1';\nconst t = `import ${s} from y;`;\nconst o = { export: 1, import: 2 };\nconst v = o.import;";
        let out = transpile("/a.js", script);
        assert_eq!(out.body, script);
        assert!(out.imports.is_empty());
        assert!(out.exports.is_empty());
    }

    #[test]
    fn test_shorthand_keyword_properties_untouched() {
        let script = "const o = { import };\nconst p = { export, import, x };\nexport default o;";
        let out = transpile("/a.js", script);
        assert_eq!(
            out.body,
            "const o = { import };\nconst p = { export, import, x };\nreturn o;"
        );
        assert!(out.imports.is_empty());
    }

    #[test]
    fn test_export_default_across_line_break() {
        let out = transpile("/a.js", "export default\n  42");
        assert_eq!(out.body, "return 42");
    }

    #[test]
    fn test_errors() {
        let t = Transpiler::default();
        let path = ModulePath::new("/a.js");
        let err = t.transpile(&path, "import x './y';").unwrap_err();
        assert_eq!(err.message, "expected 'from' in import");
        assert_eq!(err.offset, 9);
        assert!(t.transpile(&path, "export * from './x';").is_err());
        assert!(t.transpile(&path, "export default 1; export default 2;").is_err());
        assert!(t.transpile(&path, "import { default } from './x';").is_err());
    }

    #[test]
    fn test_wrapped_factory() {
        let out = transpile("/a.js", "export default 1;");
        assert_eq!(
            out.wrapped(ErrorPolicy::Isolate),
            "async (__loader) => {\ntry {\nreturn 1;\n} catch (e) {\n__loader.handleError(e);\n}\n}"
        );
        assert!(out.wrapped(ErrorPolicy::Propagate).contains("__loader.handleError(e);\nthrow e;"));
    }

    #[test]
    fn test_relative_style_paths() {
        let t = Transpiler::new(PathStyle::Relative, "js");
        let out = t
            .transpile(&ModulePath::new("./app/main.vue"), "import u from '../lib/u';")
            .unwrap();
        assert_eq!(out.imports[0].path.as_str(), "./lib/u.js");
    }

    #[test]
    fn test_import_paths_deduplicated() {
        let out = transpile("/a.js", "import x from './u.js';\nimport { y } from './u.js';");
        assert_eq!(out.import_paths(), vec![ModulePath::new("/u.js")]);
    }
}
