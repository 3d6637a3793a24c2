//! Loader for `thalli.yaml` with environment overlays.
//!
//! Sources are merged in order: environment variables prefixed with
//! `THALLI__` (nested keys use `__`, e.g. `THALLI__SEARCH__RESULTS=5`), then
//! any YAML files or inline snippets added to the loader. After merging, every
//! string value has `${VAR}` placeholders expanded, so secrets can stay in the
//! environment while the file names them:
//!
//! ```yaml
//! llm:
//!   provider: gemini
//!   api_key: "${GEMINI_API_KEY}"
//! extract:
//!   max_chars: 8000
//! search:
//!   results: 3
//! ```
//!
//! Every section is optional and falls back to its defaults.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thalli_common::LlmConfig;
use thalli_common::observability::{LogConfig, LogFormat};
use thalli_extract::ExtractOptions;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "THALLI";
const CONFIG_FILE_NAME: &str = "thalli.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThalliConfig {
    pub llm: LlmConfig,
    pub extract: ExtractOptions,
    pub search: SearchSettings,
    pub http: HttpSettings,
    pub video: VideoSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Result pages fetched per query.
    pub results: usize,
    /// Paragraphs kept from each result page.
    pub page_paragraphs: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            results: 3,
            page_paragraphs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// `None` keeps the desktop browser agent built into `thalli-http`.
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Preferred caption language code.
    pub language: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    pub stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            stderr: false,
            filter: "info".to_string(),
            dir: None,
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

impl ThalliConfig {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.results == 0 {
            return Err(ConfigError::Message(
                "search.results must be at least 1".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "http.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// `~/.config/thalli/thalli.yaml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("thalli").join(CONFIG_FILE_NAME))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate (YAML + env overrides).
pub struct ThalliConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ThalliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ThalliConfigLoader {
    /// Start empty; `THALLI__` env overrides are layered over every file in [`load`](Self::load).
    ///
    /// ```
    /// use thalli_config::ThalliConfigLoader;
    ///
    /// let config = ThalliConfigLoader::new()
    ///     .with_yaml_str("search:\n  results: 2")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.results, 2);
    /// assert_eq!(config.search.page_paragraphs, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, e.g. [`default_config_path`].
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge files in the order given, then the environment, expand `${VAR}`
    /// placeholders, and validate.
    ///
    /// ```
    /// use thalli_common::LlmConfig;
    /// use thalli_config::ThalliConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_GEMINI_KEY", "injected-from-env"); }
    ///
    /// let config = ThalliConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: gemini
    ///   api_key: "${DOC_GEMINI_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.llm {
    ///     LlmConfig::Gemini { api_key, model, .. } => {
    ///         assert_eq!(api_key, "injected-from-env");
    ///         assert_eq!(model, "gemini-1.5-pro-latest");
    ///     }
    ///     other => panic!("expected Gemini configuration, got {other:?}"),
    /// }
    ///
    /// unsafe { std::env::remove_var("DOC_GEMINI_KEY"); }
    /// ```
    pub fn load(self) -> Result<ThalliConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ThalliConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
