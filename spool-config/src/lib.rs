//! Loader for `spool.yaml` with environment overlays.
//!
//! Sources are merged in the order they are added; `SPOOL__`-prefixed
//! environment variables (with `__` between path segments, e.g.
//! `SPOOL__FETCH__TIMEOUT_SECS=10`) are always layered last. String values may
//! reference other variables as `${VAR}`; expansion is recursive and capped.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use spool_common::observability::{LogConfig, LogFormat};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_BASE_URL: &str = "https://www.threads.net";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    pub fetch: FetchSettings,
    pub extract: ExtractSettings,
    pub logging: LoggingSettings,
}

/// How profile pages are requested.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub user_agent: String,
    pub accept_language: String,
    /// Extra request headers, sent after the browser defaults.
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            retries: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Limit applied when the caller does not ask for one.
    pub max_posts: Option<usize>,
    /// Extract fragments on the rayon pool.
    pub parallel: bool,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            max_posts: None,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
            emit_stderr: false,
            dir: None,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
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

/// Builder over the `config` crate wiring.
pub struct SpoolConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SpoolConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SpoolConfigLoader {
    /// An empty loader; with no sources every setting takes its default.
    ///
    /// ```
    /// use spool_config::SpoolConfigLoader;
    ///
    /// let cfg = SpoolConfigLoader::new().load().expect("defaults");
    /// assert_eq!(cfg.fetch.base_url, "https://www.threads.net");
    /// assert_eq!(cfg.fetch.timeout_secs, 30);
    /// assert!(cfg.extract.max_posts.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing, so a bare environment is enough.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use spool_config::SpoolConfigLoader;
    ///
    /// let cfg = SpoolConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// fetch:
    ///   retries: 0
    ///   headers:
    ///     X-Debug: "1"
    /// extract:
    ///   max_posts: 5
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.fetch.retries, 0);
    /// assert_eq!(cfg.extract.max_posts, Some(5));
    /// assert!(cfg.extract.parallel);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources plus `SPOOL__` environment overrides, expand `${VAR}`
    /// placeholders and deserialize into [`SpoolConfig`].
    pub fn load(self) -> Result<SpoolConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SPOOL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("SPOOL_TEST_FOO", Some("bar"), || {
            let mut v = json!("prefix-${SPOOL_TEST_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_nested_header_values() {
        temp_env::with_var("SPOOL_TEST_COOKIE", Some("sessionid=abc"), || {
            let mut v = json!({ "fetch": { "headers": { "Cookie": "${SPOOL_TEST_COOKIE}" } } });
            expand_env_in_value(&mut v);
            assert_eq!(v["fetch"]["headers"]["Cookie"], json!("sessionid=abc"));
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars(
            [("SPOOL_TEST_A", Some("${SPOOL_TEST_B}")), ("SPOOL_TEST_B", Some("${SPOOL_TEST_A}"))],
            || {
                let mut v = json!("x=${SPOOL_TEST_A}-y");
                expand_env_in_value(&mut v);
                let s = v.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${SPOOL_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${SPOOL_DOES_NOT_EXIST}"));
    }

    #[test]
    fn logging_settings_map_onto_log_config() {
        let settings = LoggingSettings {
            filter: "spool=debug".into(),
            format: LogFormat::Json,
            emit_stderr: true,
            dir: Some(PathBuf::from("/tmp/spool-logs")),
        };
        let cfg = settings.to_log_config();
        assert_eq!(cfg.app_name, "spool");
        assert_eq!(cfg.default_filter, "spool=debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.emit_stderr);
    }
}
