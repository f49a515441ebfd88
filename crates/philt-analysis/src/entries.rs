//! Entry point discovery.
//!
//! Entry-driven builds need root files to start from. Discovery is pluggable
//! behind [`EntryProvider`] so new mechanisms can be added without touching
//! the builders; the configuration layer describes providers as a tagged
//! union ([`EntrySpec`]) and [`build_providers`] dispatches on the tag.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use path_clean::PathClean;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A named root file for closure-based traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Absolute path to the entry file.
    pub path: PathBuf,
}

/// Which side of a roots-manifest member names the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameFrom {
    #[default]
    ObjectKey,
    WebpackChunkName,
}

/// Provider description as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntrySpec {
    /// Extract entries from a roots manifest (e.g. `frontend/roots.ts`).
    #[serde(rename = "rootsTs", rename_all = "camelCase")]
    RootsTs {
        file: PathBuf,
        #[serde(default)]
        name_from: NameFrom,
    },
    /// A single `{name, path}` entry given directly.
    #[serde(rename = "explicit")]
    Explicit { name: String, path: PathBuf },
}

/// Discovery mechanism for root files.
pub trait EntryProvider: Send + Sync {
    fn discover(&self, workspace_root: &Path) -> Result<Vec<Entry>, AnalysisError>;
}

/// Returns the configured `{name, path}` pair, absolutized against the root.
#[derive(Debug, Clone)]
pub struct ExplicitProvider {
    pub name: String,
    pub path: PathBuf,
}

impl EntryProvider for ExplicitProvider {
    fn discover(&self, workspace_root: &Path) -> Result<Vec<Entry>, AnalysisError> {
        let path = if self.path.is_absolute() {
            self.path.clean()
        } else {
            workspace_root.join(&self.path).clean()
        };
        Ok(vec![Entry {
            name: self.name.clone(),
            path,
        }])
    }
}

// Captures: 1 = object key, 2 = optional webpackChunkName, 3 = import path.
// Kept permissive around comments and whitespace.
static RE_ROOT_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)([A-Za-z0-9_]+)\s*:\s*\{[^}]*?moduleFactory\s*:\s*\(\s*\)\s*=>\s*import\(\s*(?:/\*\s*webpackChunkName:\s*"(.*?)"\s*\*/\s*)?['"]([^'"]+)['"]\s*\)"#,
    )
    .unwrap()
});

/// Parses a manifest of lazily-mounted roots and extracts one entry per
/// member of the shape
///
/// ```text
/// Dashboard: { moduleFactory: () => import(/* webpackChunkName: "dash" */ "./roots/dashboard") }
/// ```
///
/// Entries are named by object key or chunk name per [`NameFrom`]; the chunk
/// name falls back to the object key when absent. Import paths resolve
/// relative to the manifest's directory.
#[derive(Debug, Clone)]
pub struct RootsManifestProvider {
    pub file: PathBuf,
    pub name_from: NameFrom,
}

impl EntryProvider for RootsManifestProvider {
    fn discover(&self, workspace_root: &Path) -> Result<Vec<Entry>, AnalysisError> {
        let manifest = if self.file.is_absolute() {
            self.file.clean()
        } else {
            workspace_root.join(&self.file).clean()
        };
        let content =
            std::fs::read_to_string(&manifest).map_err(|source| AnalysisError::ManifestRead {
                path: manifest.clone(),
                source,
            })?;

        let base_dir = manifest.parent().unwrap_or(workspace_root);
        let mut entries = Vec::new();
        for caps in RE_ROOT_MEMBER.captures_iter(&content) {
            let object_key = caps.get(1).map_or("", |m| m.as_str());
            let chunk_name = caps.get(2).map_or("", |m| m.as_str());
            let import_rel = caps.get(3).map_or("", |m| m.as_str());

            let name = match self.name_from {
                NameFrom::WebpackChunkName if !chunk_name.is_empty() => chunk_name,
                _ => object_key,
            };

            let path = if Path::new(import_rel).is_absolute() {
                PathBuf::from(import_rel).clean()
            } else {
                base_dir.join(import_rel).clean()
            };

            entries.push(Entry {
                name: name.to_owned(),
                path,
            });
        }
        Ok(entries)
    }
}

/// Construct providers from configuration specs.
pub fn build_providers(specs: &[EntrySpec]) -> Vec<Box<dyn EntryProvider>> {
    specs
        .iter()
        .map(|spec| -> Box<dyn EntryProvider> {
            match spec {
                EntrySpec::RootsTs { file, name_from } => Box::new(RootsManifestProvider {
                    file: file.clone(),
                    name_from: *name_from,
                }),
                EntrySpec::Explicit { name, path } => Box::new(ExplicitProvider {
                    name: name.clone(),
                    path: path.clone(),
                }),
            }
        })
        .collect()
}

/// Run every provider and de-duplicate entries by absolute path.
pub fn discover_entries(
    providers: &[Box<dyn EntryProvider>],
    workspace_root: &Path,
) -> Result<Vec<Entry>, AnalysisError> {
    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    let mut entries = Vec::new();
    for provider in providers {
        for entry in provider.discover(workspace_root)? {
            if seen.insert(entry.path.clone()) {
                entries.push(entry);
            }
        }
    }
    Ok(entries)
}

/// Fallback entry when no provider yields anything: the root itself, or its
/// `index.<ext>` when the root is a directory.
pub fn fallback_root_entry(root: &Path) -> PathBuf {
    if root.is_dir() {
        for name in ["index.tsx", "index.ts", "index.jsx", "index.js"] {
            let candidate = root.join(name);
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    root.to_path_buf()
}
