//! Configuration loading.
//!
//! Merge order, weakest first: built-in defaults, then a
//! `philtographer.config.{json,yaml,toml}` document (auto-detected in the
//! working directory or given via `--config`), then `PHILTOGRAPHER_*`
//! environment variables, then CLI flags.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format as _, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use philt_analysis::EntrySpec;

use crate::error::{ConfigError, Result};

/// Base name of the auto-detected config document.
pub const CONFIG_BASENAME: &str = "philtographer.config";
/// Environment variable prefix that overrides config keys.
pub const ENV_PREFIX: &str = "PHILTOGRAPHER_";

/// The merged tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace root to scan.
    pub root: PathBuf,
    /// Output document path; stdout when absent.
    pub out: Option<PathBuf>,
    /// Entry provider specs for entry-driven builds.
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            out: None,
            entries: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration, merging file, environment, and CLI flags.
    ///
    /// `config_path` is the explicit `--config` value; when absent the
    /// conventional basenames are probed in the working directory. A missing
    /// auto-detected file is fine; a missing explicit one is an error.
    pub fn load(
        config_path: Option<&Path>,
        root_flag: Option<&Path>,
        out_flag: Option<&Path>,
    ) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()).into());
                }
                Some(path.to_path_buf())
            }
            None => detect_config_file(Path::new(".")),
        };
        if let Some(path) = file {
            tracing::info!(config = %path.display(), "using config file");
            figment = merge_config_file(figment, &path)?;
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let mut config: Config = figment.extract().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
            hint: "check field names and types in the config document".into(),
        })?;

        if let Some(root) = root_flag {
            config.root = root.to_path_buf();
        }
        if let Some(out) = out_flag {
            config.out = Some(out.to_path_buf());
        }
        Ok(config)
    }
}

/// Probe for `philtographer.config.{json,yaml,toml}` in `dir`.
pub fn detect_config_file(dir: &Path) -> Option<PathBuf> {
    for ext in ["json", "yaml", "toml"] {
        let candidate = dir.join(format!("{CONFIG_BASENAME}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn merge_config_file(figment: Figment, path: &Path) -> Result<Figment> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    Ok(match ext.as_deref() {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        Some("toml") => figment.merge(Toml::file(path)),
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf()).into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use philt_analysis::NameFrom;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_without_any_file() {
        let config = Config::load(None, None, None).unwrap();
        assert_eq!(config.root, PathBuf::from("."));
        assert!(config.out.is_none());
        assert!(config.entries.is_empty());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = Config::load(Some(Path::new("/nope/philtographer.config.json")), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn json_config_parses_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.json");
        fs::write(
            &path,
            r#"{
                "root": "frontend",
                "out": "graph.json",
                "entries": [
                    {"type": "rootsTs", "file": "frontend/roots.ts", "nameFrom": "objectKey"},
                    {"type": "explicit", "name": "admin", "path": "admin/index.tsx"}
                ]
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None, None).unwrap();
        assert_eq!(config.root, PathBuf::from("frontend"));
        assert_eq!(config.out, Some(PathBuf::from("graph.json")));
        assert_eq!(config.entries.len(), 2);
        assert_eq!(
            config.entries[0],
            EntrySpec::RootsTs {
                file: PathBuf::from("frontend/roots.ts"),
                name_from: NameFrom::ObjectKey,
            }
        );
    }

    #[test]
    fn yaml_config_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.yaml");
        fs::write(
            &path,
            "root: web\nentries:\n  - type: explicit\n    name: main\n    path: src/main.tsx\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None, None).unwrap();
        assert_eq!(config.root, PathBuf::from("web"));
        assert_eq!(config.entries.len(), 1);
    }

    #[test]
    fn toml_config_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.toml");
        fs::write(
            &path,
            "root = \"app\"\n\n[[entries]]\ntype = \"explicit\"\nname = \"main\"\npath = \"src/main.tsx\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None, None).unwrap();
        assert_eq!(config.root, PathBuf::from("app"));
        assert_eq!(config.entries.len(), 1);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.json");
        fs::write(&path, r#"{"root": "from-file", "out": "file.json"}"#).unwrap();

        let config = Config::load(
            Some(&path),
            Some(Path::new("from-flag")),
            Some(Path::new("flag.json")),
        )
        .unwrap();
        assert_eq!(config.root, PathBuf::from("from-flag"));
        assert_eq!(config.out, Some(PathBuf::from("flag.json")));
    }

    #[test]
    fn malformed_config_reports_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.json");
        fs::write(&path, r#"{"entries": [{"type": "carrier-pigeon"}]}"#).unwrap();

        let err = Config::load(Some(&path), None, None).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"), "{err}");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("philtographer.config.ini");
        fs::write(&path, "root = x").unwrap();
        let err = Config::load(Some(&path), None, None).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn detect_prefers_json_then_yaml_then_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("philtographer.config.toml"), "").unwrap();
        fs::write(dir.path().join("philtographer.config.yaml"), "").unwrap();
        assert_eq!(
            detect_config_file(dir.path()).unwrap(),
            dir.path().join("philtographer.config.yaml")
        );
        fs::write(dir.path().join("philtographer.config.json"), "{}").unwrap();
        assert_eq!(
            detect_config_file(dir.path()).unwrap(),
            dir.path().join("philtographer.config.json")
        );
    }
}
