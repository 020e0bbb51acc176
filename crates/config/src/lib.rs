//! Configuration loading and validation.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default()`])
//! 2. A config file: either the path given explicitly, or `bucketeer.toml`
//!    in the platform config directory and then in the working directory
//! 3. `S3_BUCKET` (bucket name only)
//! 4. Environment variables prefixed with `BUCKETEER_` (e.g. `BUCKETEER_PREFIX`)
//!
//! Text settings (bucket, prefix, paths, region, endpoint, credentials) are
//! read from the environment exactly as set, so `S3_BUCKET=123` names the
//! bucket `123`.
//! 5. Overrides supplied by the caller, usually parsed command-line flags
//!
//! The destination [`Prefix`] and [`BucketName`] are validated while the
//! layers are extracted, so an invalid value from any source fails the load.

pub mod error;
mod validate;

pub use crate::validate::{BucketName, Prefix};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "BUCKETEER_";
/// Name of the config file looked up when none is given explicitly.
pub const CONFIG_FILE_NAME: &str = "bucketeer.toml";

const MIB: u64 = 1024 * 1024;

/// Settings that are always text. Environment values are otherwise parsed,
/// so `S3_BUCKET=123` would arrive as a number and `KEY_ID=0042` as `42`.
const TEXT_SETTINGS: &[&str] = &[
    "bucket",
    "prefix",
    "root",
    "region",
    "endpoint",
    "key_id",
    "key_secret",
    "processed_dir",
];

/// All settings for a single upload run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination bucket. Prompted for when missing and interactive.
    pub bucket: Option<BucketName>,
    /// Destination key prefix. Prompted for when missing and interactive.
    pub prefix: Option<Prefix>,
    /// Directory to upload. Defaults to the current working directory.
    pub root: Option<PathBuf>,
    pub region: String,
    /// Custom endpoint URL for S3-compatible services.
    pub endpoint: Option<String>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    /// Use path-style addressing (needed by most non-AWS services).
    pub path_style: bool,
    /// Maximum number of files uploading at once.
    pub concurrency: usize,
    /// Files of at least this many bytes are uploaded in parts.
    pub multipart_threshold: u64,
    pub part_size: u64,
    /// Maximum parts of a single file uploading at once.
    pub part_concurrency: usize,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Directory names that are never descended into.
    pub exclude: Vec<String>,
    /// Move successfully uploaded files here, keeping their relative paths.
    pub processed_dir: Option<PathBuf>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            root: None,
            region: "us-east-1".to_string(),
            endpoint: None,
            key_id: None,
            key_secret: None,
            path_style: false,
            concurrency: 32,
            multipart_threshold: 8 * MIB,
            part_size: 8 * MIB,
            part_concurrency: 16,
            max_attempts: 4,
            exclude: vec![".git".to_string()],
            processed_dir: None,
        }
    }
}

impl Config {
    /// Load settings from files and the environment.
    ///
    /// `file` must exist when given; otherwise the default locations are
    /// tried and silently skipped when absent.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::extract(Self::figment(file)?)
    }

    /// Same as [`load()`](Self::load), with `overrides` merged on top of every
    /// other source. Fields serialized as absent leave lower layers intact.
    pub fn load_with(file: Option<&Path>, overrides: impl Serialize) -> Result<Self> {
        Self::extract(Self::figment(file)?.merge(Serialized::defaults(overrides)))
    }

    /// The layered provider stack, before extraction.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                for path in default_paths().into_iter().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "Loading config file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(TEXT_SETTINGS))
            .merge(Serialized::defaults(text_env())))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::OutOfRange("concurrency"));
        }
        if self.part_concurrency == 0 {
            exn::bail!(ErrorKind::OutOfRange("part_concurrency"));
        }
        if self.max_attempts == 0 {
            exn::bail!(ErrorKind::OutOfRange("max_attempts"));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// Text settings from the environment, exactly as set. `S3_BUCKET` comes
/// first so that `BUCKETEER_BUCKET` replaces it.
fn text_env() -> BTreeMap<String, String> {
    let legacy = Env::raw().only(&["S3_BUCKET"]).map(|_| "bucket".into());
    let prefixed = Env::prefixed(ENV_PREFIX).only(TEXT_SETTINGS);
    legacy
        .iter()
        .chain(prefixed.iter())
        .map(|(key, value)| (key.as_str().to_string(), value))
        .collect()
}

/// Platform config directory first, so a file in the working directory wins.
fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dirs) = ProjectDirs::from("", "", "bucketeer") {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.exclude, vec![".git".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_then_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bucketeer.toml",
                r#"
                bucket = "file-bucket"
                prefix = "from-file/"
                concurrency = 8
                "#,
            )?;
            jail.set_env("BUCKETEER_PREFIX", "from-env/");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("file-bucket"));
            assert_eq!(config.prefix.as_ref().map(Prefix::as_str), Some("from-env/"));
            assert_eq!(config.concurrency, 8);

            let overrides = HashMap::from([("concurrency", 2)]);
            let config = Config::load_with(None, overrides).unwrap();
            assert_eq!(config.concurrency, 2);
            assert_eq!(config.prefix.as_ref().map(Prefix::as_str), Some("from-env/"));
            Ok(())
        });
    }

    #[test]
    fn test_s3_bucket_env() {
        Jail::expect_with(|jail| {
            jail.set_env("S3_BUCKET", "legacy-bucket");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("legacy-bucket"));
            // The prefixed variable takes precedence.
            jail.set_env("BUCKETEER_BUCKET", "new-bucket");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("new-bucket"));
            Ok(())
        });
    }

    #[test]
    fn test_numeric_text_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("S3_BUCKET", "123");
            jail.set_env("BUCKETEER_KEY_ID", "0012345");
            jail.set_env("BUCKETEER_KEY_SECRET", "1.50");
            jail.set_env("BUCKETEER_REGION", "42");
            jail.set_env("BUCKETEER_ROOT", "2024");
            jail.set_env("BUCKETEER_CONCURRENCY", "7");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("123"));
            assert_eq!(config.key_id.as_deref(), Some("0012345"));
            assert_eq!(config.key_secret.as_deref(), Some("1.50"));
            assert_eq!(config.region, "42");
            assert_eq!(config.root, Some(PathBuf::from("2024")));
            assert_eq!(config.concurrency, 7);
            Ok(())
        });
    }

    #[test]
    fn test_text_env_beats_file() {
        Jail::expect_with(|jail| {
            jail.create_file("bucketeer.toml", "bucket = \"file-bucket\"\nregion = \"eu-west-1\"\n")?;
            jail.set_env("S3_BUCKET", "456");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("456"));
            assert_eq!(config.region, "eu-west-1");

            let overrides = HashMap::from([("bucket", "cli-bucket")]);
            let config = Config::load_with(None, overrides).unwrap();
            assert_eq!(config.bucket.as_ref().map(BucketName::as_str), Some("cli-bucket"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file("upload.yaml", "prefix: videos/raw/\nexclude: [\".git\", \"node_modules\"]\n")?;
            let config = Config::load(Some(Path::new("upload.yaml"))).unwrap();
            assert_eq!(config.prefix.as_ref().map(Prefix::as_str), Some("videos/raw/"));
            assert_eq!(config.exclude, vec![".git".to_string(), "node_modules".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_missing() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::NotFound(PathBuf::from("nope.toml")));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_format() {
        Jail::expect_with(|jail| {
            jail.create_file("config.ini", "prefix=a/")?;
            let err = Config::load(Some(Path::new("config.ini"))).unwrap_err();
            assert_eq!(*err, ErrorKind::UnsupportedFormat(PathBuf::from("config.ini")));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("BUCKETEER_PREFIX", "/a/");
            let err = Config::load(None).unwrap_err();
            assert_eq!(*err, ErrorKind::Invalid);
            Ok(())
        });
        Jail::expect_with(|jail| {
            jail.set_env("BUCKETEER_BUCKET", "a..b");
            let err = Config::load(None).unwrap_err();
            assert_eq!(*err, ErrorKind::Invalid);
            Ok(())
        });
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("BUCKETEER_CONCURRENCY", "0");
            let err = Config::load(None).unwrap_err();
            assert_eq!(*err, ErrorKind::OutOfRange("concurrency"));
            Ok(())
        });
    }
}
