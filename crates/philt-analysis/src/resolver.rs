//! Module specifier resolution.
//!
//! Maps raw specifiers to files on disk. Relative and absolute specifiers
//! are probed directly; bare specifiers consult the nearest tsconfig's
//! `compilerOptions.baseUrl` / `paths` before being tagged as external
//! packages.
//!
//! Probe policy (first hit wins):
//!
//! 1. the exact candidate, if it is a regular file;
//! 2. `index.<ext>` inside the candidate when it is a directory;
//! 3. `candidate + <ext>` when the candidate has no extension.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Extension order for the tsconfig-aware resolver.
const RICH_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];
/// Extension order for the legacy full-tree resolver.
const LEGACY_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing regular file on disk.
    Local(PathBuf),
    /// A bare package import, kept as a `pkg:<spec>` node.
    External(String),
    /// A relative specifier that matched nothing on disk.
    Unresolved,
}

impl Resolution {
    /// The graph node id for this resolution, if any.
    pub fn node_id(&self) -> Option<String> {
        match self {
            Resolution::Local(path) => Some(path.to_string_lossy().into_owned()),
            Resolution::External(spec) => Some(format!("pkg:{spec}")),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Resolution::Local(_))
    }
}

/// Whether a specifier addresses the filesystem rather than a package.
pub fn is_path_spec(spec: &str) -> bool {
    spec.starts_with("./") || spec.starts_with("../") || spec.starts_with('/')
}

/// Whether a specifier is relative to the importing file.
pub fn is_relative_spec(spec: &str) -> bool {
    spec.starts_with("./") || spec.starts_with("../")
}

/// Probe a candidate path following the first-hit policy.
pub(crate) fn probe(candidate: &Path, extensions: &[&str]) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if candidate.is_dir() {
        for ext in extensions {
            let index = candidate.join(format!("index.{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    if candidate.extension().is_none() {
        for ext in extensions {
            let with_ext = candidate.with_extension(ext);
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }
    }
    None
}

/// Candidate paths that a failed probe tried, for diagnostics.
pub(crate) fn probe_attempts(candidate: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut attempts = vec![candidate.to_path_buf()];
    if candidate.is_dir() {
        for ext in extensions {
            attempts.push(candidate.join(format!("index.{ext}")));
        }
    }
    if candidate.extension().is_none() {
        for ext in extensions {
            attempts.push(candidate.with_extension(ext));
        }
    }
    attempts
}

/// Resolve an entry seed that may omit its extension (manifest imports are
/// written webpack-style, without one). Falls back to the path as given.
pub fn probe_seed(path: PathBuf) -> PathBuf {
    match probe(&path, RICH_EXTENSIONS) {
        Some(resolved) => resolved,
        None => path,
    }
}

fn candidate_for(from_file: &Path, spec: &str) -> PathBuf {
    let base = from_file.parent().unwrap_or_else(|| Path::new("."));
    base.join(spec).clean()
}

/// Legacy resolution, used by the full-tree builder: relative specifiers are
/// probed with `.ts`/`.tsx` only, every bare specifier is external.
pub fn resolve_legacy(from_file: &Path, spec: &str) -> Resolution {
    if !is_path_spec(spec) {
        return Resolution::External(spec.to_owned());
    }
    match probe(&candidate_for(from_file, spec), LEGACY_EXTENSIONS) {
        Some(path) => Resolution::Local(path),
        None => Resolution::Unresolved,
    }
}

/// The subset of tsconfig the resolver cares about.
#[derive(Debug, Default, Deserialize)]
struct TsConfigFile {
    #[serde(default, rename = "compilerOptions")]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
struct CompilerOptions {
    #[serde(default, rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<PathsMap>,
}

/// tsconfig `paths` is a JSON object; deserialized order-preserving so
/// pattern precedence is stable.
#[derive(Debug, Default)]
struct PathsMap(Vec<(String, Vec<String>)>);

impl<'de> serde::Deserialize<'de> for PathsMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;
        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = PathsMap;
            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of path patterns to replacement lists")
            }
            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((key, value));
                }
                Ok(PathsMap(entries))
            }
        }
        deserializer.deserialize_map(Visitor)
    }
}

/// tsconfig state that applies to one directory subtree.
#[derive(Debug, Default)]
struct ResolverConfig {
    /// Directory alias targets are resolved against (`root/baseUrl`).
    base_dir: PathBuf,
    /// `compilerOptions.paths` patterns in declaration order.
    paths: Vec<(String, Vec<String>)>,
}

/// tsconfig-aware resolver with per-directory config caching.
///
/// Config discovery walks upward from the importing file's directory to the
/// workspace root, preferring `tsconfig.base.json` over `tsconfig.json` at
/// each level. Lookups are cached per directory because resolution runs once
/// per import in hot build loops.
pub struct Resolver {
    workspace_root: PathBuf,
    cache: Mutex<FxHashMap<PathBuf, Arc<ResolverConfig>>>,
}

impl Resolver {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into().clean(),
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Resolve `spec` as imported from `from_file`.
    pub fn resolve(&self, from_file: &Path, spec: &str) -> Resolution {
        if is_path_spec(spec) {
            return match probe(&candidate_for(from_file, spec), RICH_EXTENSIONS) {
                Some(path) => Resolution::Local(path),
                None => Resolution::Unresolved,
            };
        }

        let start = from_file
            .parent()
            .unwrap_or(&self.workspace_root)
            .to_path_buf();
        let config = self.config_for(&start);

        if let Some(path) = self.resolve_alias(&config, spec) {
            return Resolution::Local(path);
        }

        // A bare spec may still be a path relative to baseUrl.
        if let Some(path) = probe(&config.base_dir.join(spec).clean(), RICH_EXTENSIONS) {
            return Resolution::Local(path);
        }

        Resolution::External(spec.to_owned())
    }

    /// Match `spec` against `compilerOptions.paths` patterns.
    fn resolve_alias(&self, config: &ResolverConfig, spec: &str) -> Option<PathBuf> {
        if config.paths.is_empty() {
            return None;
        }
        // Exact keys first.
        for (pattern, replacements) in &config.paths {
            if pattern == spec {
                for replacement in replacements {
                    if let Some(path) =
                        probe(&config.base_dir.join(replacement).clean(), RICH_EXTENSIONS)
                    {
                        return Some(path);
                    }
                }
            }
        }
        // Then wildcard patterns like `@app/*`.
        for (pattern, replacements) in &config.paths {
            let Some(star) = pattern.find('*') else {
                continue;
            };
            let head = &pattern[..star];
            let Some(tail) = spec.strip_prefix(head) else {
                continue;
            };
            for replacement in replacements {
                let target = replacement.replace('*', tail);
                if let Some(path) = probe(&config.base_dir.join(target).clean(), RICH_EXTENSIONS) {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Directories implied by the workspace tsconfig, so a watcher can cover
    /// alias targets that live outside the watched root.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let config = self.config_for(&self.workspace_root);
        let mut dirs = vec![config.base_dir.clone()];
        for (_, replacements) in &config.paths {
            for replacement in replacements {
                let prefix = match replacement.find('*') {
                    Some(i) => &replacement[..i],
                    None => replacement.as_str(),
                };
                dirs.push(config.base_dir.join(prefix).clean());
            }
        }
        dirs.sort_unstable();
        dirs.dedup();
        dirs
    }

    /// The config governing `dir`, from cache or by walking upward.
    fn config_for(&self, dir: &Path) -> Arc<ResolverConfig> {
        if let Some(cached) = self.cache.lock().get(dir) {
            return Arc::clone(cached);
        }

        let mut current = Some(dir);
        let config = loop {
            let Some(level) = current else {
                break Arc::new(ResolverConfig {
                    base_dir: self.workspace_root.clone(),
                    paths: Vec::new(),
                });
            };
            if let Some(config) = load_config_at(level) {
                break Arc::new(config);
            }
            if level == self.workspace_root {
                break Arc::new(ResolverConfig {
                    base_dir: self.workspace_root.clone(),
                    paths: Vec::new(),
                });
            }
            current = level.parent();
        };

        self.cache
            .lock()
            .insert(dir.to_path_buf(), Arc::clone(&config));
        config
    }
}

/// Try to load `tsconfig.base.json` / `tsconfig.json` in one directory.
fn load_config_at(dir: &Path) -> Option<ResolverConfig> {
    for name in ["tsconfig.base.json", "tsconfig.json"] {
        let path = dir.join(name);
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        let parsed: TsConfigFile = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "skipping malformed tsconfig");
                continue;
            }
        };
        let base_dir = match parsed.compiler_options.base_url {
            Some(ref base) => dir.join(base).clean(),
            None => dir.to_path_buf(),
        };
        return Some(ResolverConfig {
            base_dir,
            paths: parsed.compiler_options.paths.unwrap_or_default().0,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn legacy_resolves_relative_with_extension_probe() {
        let dir = TempDir::new().unwrap();
        let b = write(dir.path(), "b.ts", "export const x = 1");
        let from = dir.path().join("a.ts");
        assert_eq!(resolve_legacy(&from, "./b"), Resolution::Local(b));
    }

    #[test]
    fn legacy_tags_bare_specs_as_external() {
        let from = PathBuf::from("/anywhere/a.ts");
        let got = resolve_legacy(&from, "react");
        assert_eq!(got, Resolution::External("react".into()));
        assert_eq!(got.node_id().unwrap(), "pkg:react");
    }

    #[test]
    fn legacy_skips_js_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "util.js", "module.exports = 1");
        let from = dir.path().join("a.ts");
        assert_eq!(resolve_legacy(&from, "./util"), Resolution::Unresolved);
    }

    #[test]
    fn first_hit_prefers_ts_over_js() {
        let dir = TempDir::new().unwrap();
        let ts = write(dir.path(), "util.ts", "export const x = 1");
        write(dir.path(), "util.js", "module.exports = 1");
        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("a.ts");
        assert_eq!(resolver.resolve(&from, "./util"), Resolution::Local(ts));
    }

    #[test]
    fn directory_resolves_to_index() {
        let dir = TempDir::new().unwrap();
        let index = write(dir.path(), "comp/index.jsx", "export default 1");
        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("main.tsx");
        assert_eq!(resolver.resolve(&from, "./comp"), Resolution::Local(index));
    }

    #[test]
    fn rich_mode_resolves_js_and_jsx() {
        let dir = TempDir::new().unwrap();
        let util = write(dir.path(), "util.js", "module.exports = 1");
        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("main.tsx");
        assert_eq!(resolver.resolve(&from, "./util"), Resolution::Local(util));
    }

    #[test]
    fn unresolved_relative_import_reports_unresolved() {
        let dir = TempDir::new().unwrap();
        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("a.ts");
        assert_eq!(resolver.resolve(&from, "./missing"), Resolution::Unresolved);
    }

    #[test]
    fn alias_exact_and_wildcard_patterns_resolve() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tsconfig.json",
            r#"{
                "compilerOptions": {
                    "baseUrl": ".",
                    "paths": {
                        "app-core": ["src/core/index"],
                        "@widgets/*": ["src/widgets/*"]
                    }
                }
            }"#,
        );
        let core = write(dir.path(), "src/core/index.ts", "export const core = 1");
        let button = write(dir.path(), "src/widgets/button.tsx", "export const B = 1");

        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("src/app.ts");
        assert_eq!(resolver.resolve(&from, "app-core"), Resolution::Local(core));
        assert_eq!(
            resolver.resolve(&from, "@widgets/button"),
            Resolution::Local(button)
        );
    }

    #[test]
    fn bare_spec_falls_back_to_base_url_then_external() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tsconfig.json",
            r#"{"compilerOptions": {"baseUrl": "src"}}"#,
        );
        let helper = write(dir.path(), "src/helpers/fmt.ts", "export const f = 1");

        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("src/app.ts");
        assert_eq!(
            resolver.resolve(&from, "helpers/fmt"),
            Resolution::Local(helper)
        );
        assert_eq!(
            resolver.resolve(&from, "react"),
            Resolution::External("react".into())
        );
    }

    #[test]
    fn nearest_config_wins_over_ancestor() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tsconfig.json",
            r#"{"compilerOptions": {"paths": {"lib": ["root-lib"]}}}"#,
        );
        write(dir.path(), "root-lib.ts", "export const root = 1");
        write(
            dir.path(),
            "packages/web/tsconfig.json",
            r#"{"compilerOptions": {"paths": {"lib": ["local-lib"]}}}"#,
        );
        let local = write(dir.path(), "packages/web/local-lib.ts", "export const l = 1");

        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("packages/web/src/app.ts");
        // The upward walk stops at packages/web, never reaching the root mapping.
        assert_eq!(resolver.resolve(&from, "lib"), Resolution::Local(local));
    }

    #[test]
    fn tsconfig_base_takes_precedence() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tsconfig.base.json",
            r#"{"compilerOptions": {"paths": {"x": ["base-x"]}}}"#,
        );
        write(
            dir.path(),
            "tsconfig.json",
            r#"{"compilerOptions": {"paths": {"x": ["plain-x"]}}}"#,
        );
        let base_x = write(dir.path(), "base-x.ts", "export const x = 1");
        write(dir.path(), "plain-x.ts", "export const x = 2");

        let resolver = Resolver::new(dir.path());
        let from = dir.path().join("a.ts");
        assert_eq!(resolver.resolve(&from, "x"), Resolution::Local(base_x));
    }

    #[test]
    fn probe_seed_completes_extensionless_entries() {
        let dir = TempDir::new().unwrap();
        let shop = write(dir.path(), "roots/shop.ts", "export const s = 1");
        assert_eq!(probe_seed(dir.path().join("roots/shop")), shop);
        // Unmatched seeds pass through untouched.
        let ghost = dir.path().join("roots/ghost");
        assert_eq!(probe_seed(ghost.clone()), ghost);
    }

    #[test]
    fn watch_dirs_includes_base_and_alias_prefixes() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tsconfig.json",
            r#"{
                "compilerOptions": {
                    "baseUrl": ".",
                    "paths": {"@shared/*": ["libs/shared/*"]}
                }
            }"#,
        );
        let resolver = Resolver::new(dir.path());
        let dirs = resolver.watch_dirs();
        assert!(dirs.contains(&dir.path().to_path_buf().clean()));
        assert!(dirs.contains(&dir.path().join("libs/shared").clean()));
    }
}
