//! Import specifier extraction.
//!
//! Two extractors over file contents: a regex fast path that needs no parse,
//! and a tree-sitter AST path that understands the actual grammar. Both
//! produce a de-duplicated specifier list with glob and asset/style imports
//! filtered out. The AST path returns `None` when the parse fails so callers
//! can fall back to the regex path.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use tree_sitter::{Language, Node, Parser};

static RE_IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import(?:\s+type)?\s+.*?from\s+['"]([^'"]+)['"]"#).unwrap()
});
// Import clauses spanning lines: the brace body may contain newlines
// (character classes match them), which the dot in RE_IMPORT_FROM cannot.
static RE_IMPORT_MULTILINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*import(?:\s+type)?\s+(?:[A-Za-z0-9_$]+\s*,\s*)?\{[^}]*\}\s*from\s+['"]([^'"]+)['"]"#,
    )
    .unwrap()
});
static RE_IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#).unwrap());
static RE_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static RE_DYNAMIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static RE_EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*export\s+.*?\sfrom\s+['"]([^'"]+)['"]"#).unwrap()
});
static RE_EXPORT_MULTILINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*export\s+\{[^}]*\}\s*from\s+['"]([^'"]+)['"]"#).unwrap()
});

pub(crate) static TS_LANGUAGE: Lazy<Language> =
    Lazy::new(|| tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into());
pub(crate) static TSX_LANGUAGE: Lazy<Language> =
    Lazy::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

/// Suffixes of specifiers that never contribute graph edges: styles, data,
/// and media that a bundler loader would handle.
const FILTERED_SUFFIXES: &[&str] = &[
    ".css", ".scss", ".less", ".yml", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".mp3", ".mp4",
];

/// Whether a specifier should be dropped before resolution.
fn is_filtered(spec: &str) -> bool {
    if spec.contains('*') {
        return true;
    }
    let lower = spec.to_ascii_lowercase();
    FILTERED_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Extract module specifiers with regexes.
///
/// Covers `import … from "x"`, bare `import "x"`, `export … from "x"`,
/// `require("x")`, and dynamic `import("x")`, including `import type` and
/// multi-line clause forms. The result is de-duplicated in first-seen order.
pub fn parse_imports(content: &str) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::new();
    for re in [
        &*RE_IMPORT_FROM,
        &*RE_IMPORT_MULTILINE,
        &*RE_IMPORT_BARE,
        &*RE_REQUIRE,
        &*RE_DYNAMIC,
        &*RE_EXPORT_FROM,
        &*RE_EXPORT_MULTILINE,
    ] {
        for caps in re.captures_iter(content) {
            let spec = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if spec.is_empty() || is_filtered(spec) {
                continue;
            }
            if seen.insert(spec) {
                out.push(spec.to_owned());
            }
        }
    }
    out
}

/// Pick the grammar for a path: TypeScript for `.ts`, TSX for everything else.
pub(crate) fn language_for(path: &Path) -> &'static Language {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("ts") => &TS_LANGUAGE,
        _ => &TSX_LANGUAGE,
    }
}

pub(crate) fn node_text<'a>(src: &'a [u8], node: Node<'_>) -> &'a str {
    std::str::from_utf8(&src[node.byte_range()])
        .unwrap_or("")
        .trim()
}

fn trim_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '\'' || c == '"')
}

/// Extract module specifiers from a tree-sitter parse.
///
/// Harvests import/export statement sources plus `require("x")` and dynamic
/// `import("x")` call expressions. Returns `None` when the source does not
/// parse, letting callers fall back to [`parse_imports`].
pub fn parse_imports_ast(path: &Path, content: &[u8]) -> Option<Vec<String>> {
    let mut parser = Parser::new();
    parser.set_language(language_for(path)).ok()?;
    let tree = parser.parse(content, None)?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::new();
    let mut add = |spec: &str| {
        let spec = trim_quotes(spec.trim());
        if spec.is_empty() || is_filtered(spec) {
            return;
        }
        if seen.insert(spec.to_owned()) {
            out.push(spec.to_owned());
        }
    };

    collect_specifiers(tree.root_node(), content, &mut add);
    Some(out)
}

fn collect_specifiers<'a>(node: Node<'a>, src: &[u8], add: &mut impl FnMut(&str)) {
    match node.kind() {
        "import_statement" | "export_statement" => {
            for i in 0..node.named_child_count() {
                let child = node.named_child(i).unwrap();
                if child.kind() == "string" {
                    add(node_text(src, child));
                }
            }
        }
        "call_expression" => {
            if let Some(spec) = call_specifier(node, src) {
                add(spec);
            }
        }
        _ => {}
    }
    for i in 0..node.named_child_count() {
        collect_specifiers(node.named_child(i).unwrap(), src, add);
    }
}

/// The first string argument of `require("x")` or `import("x")`, if this
/// call expression is one of those.
fn call_specifier<'a>(node: Node<'a>, src: &'a [u8]) -> Option<&'a str> {
    let callee = node.child_by_field_name("function")?;
    let is_loader = match callee.kind() {
        // Dynamic `import(...)` keeps its keyword kind in the grammar.
        "import" => true,
        "identifier" => matches!(node_text(src, callee), "require" | "import"),
        _ => false,
    };
    if !is_loader {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    for i in 0..args.named_child_count() {
        let arg = args.named_child(i).unwrap();
        if arg.kind() == "string" {
            return Some(node_text(src, arg));
        }
    }
    None
}

/// AST extraction with regex fallback.
pub fn extract_imports(path: &Path, content: &[u8]) -> Vec<String> {
    match parse_imports_ast(path, content) {
        Some(specs) => specs,
        None => parse_imports(&String::from_utf8_lossy(content)),
    }
}
