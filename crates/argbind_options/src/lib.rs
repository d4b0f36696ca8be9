//! argbind_options: argbind.json parsing and compiler options.
//!
//! Parses project files and provides the CompilerOptions structure shared by
//! the driver and the command line.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project file name, looked up in the working directory.
pub const PROJECT_FILE_NAME: &str = "argbind.json";

/// Compiler options, matching the `compilerOptions` object of argbind.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    // -- Cache --
    pub cache_dir: Option<String>,
    pub no_cache: Option<bool>,

    // -- Scheduling --
    /// Worker threads for parallel compilation. Rayon's default when unset.
    pub jobs: Option<usize>,

    // -- Binding --
    /// Bind `for` loop variables in the loop's own scope instead of the
    /// enclosing one.
    pub for_loop_local_only: Option<bool>,

    // -- Output --
    pub list_files: Option<bool>,
}

impl CompilerOptions {
    pub fn cache_enabled(&self) -> bool {
        !self.no_cache.unwrap_or(false)
    }

    pub fn for_loop_local_only(&self) -> bool {
        self.for_loop_local_only.unwrap_or(false)
    }

    /// Overlay `other` on top of `self`: every option set in `other` wins.
    pub fn merge(mut self, other: &CompilerOptions) -> Self {
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir.clone();
        }
        if other.no_cache.is_some() {
            self.no_cache = other.no_cache;
        }
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
        if other.for_loop_local_only.is_some() {
            self.for_loop_local_only = other.for_loop_local_only;
        }
        if other.list_files.is_some() {
            self.list_files = other.list_files;
        }
        self
    }
}

/// The argbind.json file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub compiler_options: Option<CompilerOptions>,
    pub files: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Listed files resolved against the directory holding the project file.
    pub fn resolved_files(&self, project_path: &Path) -> Vec<PathBuf> {
        let root = project_path.parent().unwrap_or_else(|| Path::new("."));
        self.files
            .iter()
            .flatten()
            .map(|file| root.join(file))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse an argbind.json file from a string.
pub fn parse_config(content: &str) -> Result<ProjectConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse an argbind.json file from a path.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_options() {
        let config = parse_config(
            r#"{
                "compilerOptions": { "cacheDir": ".argbind", "jobs": 4, "forLoopLocalOnly": true },
                "files": ["lib/a.json", "lib/b.json"]
            }"#,
        )
        .unwrap();
        let options = config.compiler_options.unwrap();
        assert_eq!(options.cache_dir.as_deref(), Some(".argbind"));
        assert_eq!(options.jobs, Some(4));
        assert!(options.for_loop_local_only());
        assert!(options.cache_enabled());
        assert_eq!(config.files.unwrap().len(), 2);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("{}").unwrap();
        assert!(config.compiler_options.is_none());
        let options = CompilerOptions::default();
        assert!(!options.for_loop_local_only());
        assert!(options.cache_enabled());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = CompilerOptions {
            cache_dir: Some("a".into()),
            jobs: Some(2),
            ..Default::default()
        };
        let overrides = CompilerOptions {
            jobs: Some(8),
            no_cache: Some(true),
            ..Default::default()
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.cache_dir.as_deref(), Some("a"));
        assert_eq!(merged.jobs, Some(8));
        assert!(!merged.cache_enabled());
    }

    #[test]
    fn test_resolved_files() {
        let config = parse_config(r#"{ "files": ["a.json"] }"#).unwrap();
        let files = config.resolved_files(Path::new("proj/argbind.json"));
        assert_eq!(files, vec![PathBuf::from("proj/a.json")]);
    }

    #[test]
    fn test_unknown_file_is_io_error() {
        let err = parse_config_file(Path::new("/nonexistent/argbind.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
