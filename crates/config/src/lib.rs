//! Runtime configuration.
//!
//! Values are layered with `figment`: compiled-in defaults, then a config file
//! (TOML, YAML or JSON, picked by extension), then `AMPSTORY_`-prefixed
//! environment variables where `__` separates nested keys, for example
//! `AMPSTORY_MEDIA__URL=https://cdn.example.com/media/`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "AMPSTORY_";
const DEFAULT_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ampstory")
}

fn data_dir() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => std::env::temp_dir().join("ampstory"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub fetch: FetchConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, created on first use
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Absolute directory that stored images, renditions and videos live under
    pub root: PathBuf,
    /// Public URL prefix the media root is served from
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_body_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive, `RUST_LOG` syntax
    pub filter: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: data_dir().join("ampstory.sqlite3") }
    }
}
impl Default for MediaConfig {
    fn default() -> Self {
        Self { root: data_dir().join("media"), url: "/media/".to_string() }
    }
}
impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("ampstory/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}
impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Where the config file is looked for when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
    }

    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicit `path` must exist. Without one, the file at
    /// [`Config::default_path`] is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        let figment = Self::figment(file.as_deref())?.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(&figment)
    }

    /// Defaults plus (optionally) one config file, without the environment.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let Some(file) = file else {
            return Ok(figment);
        };
        tracing::debug!(path = %file.display(), "Loading config file");
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file_exact(file)),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
            Some("json") => figment.merge(Json::file_exact(file)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
        })
    }

    /// Extract and validate a config from an already-assembled figment.
    pub fn extract(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validated()
    }

    fn validated(mut self) -> Result<Self> {
        if !self.media.root.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!("media.root must be absolute, got {}", self.media.root.display())));
        }
        let url = self.media.url.trim();
        if url.is_empty() {
            exn::bail!(ErrorKind::Invalid("media.url must not be empty".to_string()));
        }
        self.media.url = match url.ends_with('/') {
            true => url.to_string(),
            false => format!("{url}/"),
        };
        if self.fetch.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.timeout_secs must be greater than zero".to_string()));
        }
        if self.fetch.max_body_bytes == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.max_body_bytes must be greater than zero".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn load_file(name: &str, contents: &str) -> Result<Config> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        Config::extract(&Config::figment(Some(&path))?)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::extract(&Config::figment(None).unwrap()).unwrap();
        assert_eq!(config.media.url, "/media/");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert_eq!(config.log.filter, "info");
    }

    #[rstest]
    #[case::toml("config.toml", "[media]\nroot = \"/srv/media\"\nurl = \"http://media.example.com/media\"\n")]
    #[case::yaml("config.yaml", "media:\n  root: /srv/media\n  url: http://media.example.com/media\n")]
    #[case::yml("config.yml", "media:\n  root: /srv/media\n  url: http://media.example.com/media\n")]
    #[case::json("config.json", r#"{"media": {"root": "/srv/media", "url": "http://media.example.com/media"}}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        let config = load_file(name, contents).unwrap();
        assert_eq!(config.media.root, PathBuf::from("/srv/media"));
        // Trailing slash is added so paths can be appended directly.
        assert_eq!(config.media.url, "http://media.example.com/media/");
        // Untouched sections keep their defaults.
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file("config.ini", "[media]").unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here/config.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_type_error() {
        let err = load_file("config.toml", "[fetch]\ntimeout_secs = \"soon\"\n").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
    }

    #[rstest]
    #[case::relative_root("[media]\nroot = \"media\"\n")]
    #[case::empty_url("[media]\nroot = \"/srv/media\"\nurl = \"  \"\n")]
    #[case::zero_timeout("[fetch]\ntimeout_secs = 0\n")]
    #[case::zero_body_limit("[fetch]\nmax_body_bytes = 0\n")]
    fn test_validation(#[case] contents: &str) {
        let err = load_file("config.toml", contents).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }
}
