//! Generator configuration.
//!
//! Values come from built-in defaults, optionally overridden by a TOML file
//! and finally by command-line flags.
//!
//! ```toml
//! export_marker = "DLL_EXPORT"
//! out_keyword = "OUT"
//! return_policy = "buffers"
//!
//! [types]
//! size_t = "ctypes.c_size_t"
//! void = ""   # no return marshalling type
//! ```

use crate::token::is_identifier;
use crate::types::TypeMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_EXPORT_MARKER: &str = "DLL_EXPORT";
pub const DEFAULT_OUT_KEYWORD: &str = "OUT";
pub const DEFAULT_RUNTIME_MODULE: &str = "native_library_wrapper";
pub const DEFAULT_RUNTIME_CLASS: &str = "NativeLibraryWrapper";
pub const DEFAULT_OUTPUT_FILE: &str = "native.py";

/// What a generated function returns when its declaration has both a
/// non-void return type and output buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReturnPolicy {
    /// Return the native call's result, buffers are written through
    Scalar,
    /// Return the output buffers, the call's result is discarded
    #[default]
    Buffers,
    /// Return the call's result followed by the output buffers
    Combined,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file '{}': {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("'{field}' must be a non-empty identifier, got '{value}'")]
    InvalidKeyword { field: &'static str, value: String },
    #[error("'runtime_imports' must name at least the dispatcher class")]
    MissingDispatcher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Identifier that introduces a bound declaration
    pub export_marker: String,
    /// Identifier that flags a parameter as output buffer
    pub out_keyword: String,
    pub return_policy: ReturnPolicy,
    /// Python module providing the dispatcher class
    pub runtime_module: String,
    /// Names imported from `runtime_module`; the first one is the dispatcher
    pub runtime_imports: Vec<String>,
    /// Extra return types merged over the default table. An empty target
    /// means "no return marshalling type".
    pub types: IndexMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            export_marker: DEFAULT_EXPORT_MARKER.to_string(),
            out_keyword: DEFAULT_OUT_KEYWORD.to_string(),
            return_policy: ReturnPolicy::default(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            runtime_imports: vec![DEFAULT_RUNTIME_CLASS.to_string()],
            types: IndexMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: GeneratorConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("export_marker", &self.export_marker),
            ("out_keyword", &self.out_keyword),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::InvalidKeyword {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.runtime_imports.is_empty() {
            return Err(ConfigError::MissingDispatcher);
        }
        Ok(())
    }

    /// Default table with the configured entries merged over it.
    pub fn type_map(&self) -> TypeMap {
        let mut map = TypeMap::default();
        for (declared, target) in &self.types {
            let target = target.trim();
            map.insert(declared, (!target.is_empty()).then_some(target));
        }
        map
    }
}
