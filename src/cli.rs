use bucketeer_config::error::ErrorKind as ConfigErrorKind;
use bucketeer_config::{BucketName, Prefix};
use clap::{ArgAction, Parser};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Upload every file below a directory to an S3-compatible bucket.
///
/// Settings not given on the command line are read from the environment
/// (`BUCKETEER_*`, `S3_BUCKET`) and from `bucketeer.toml`. A missing bucket
/// or prefix is asked for when running in a terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Directory to upload [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Key prefix: one or more segments each ending in '/', e.g. "videos/raw/"
    #[arg(long, value_parser = parse_prefix)]
    pub prefix: Option<Prefix>,
    #[arg(long, value_parser = parse_bucket)]
    pub bucket: Option<BucketName>,
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub region: Option<String>,
    /// Endpoint URL of an S3-compatible service
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    /// Maximum number of files uploading at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Move successfully uploaded files into this directory
    #[arg(long, value_name = "DIR")]
    pub processed_dir: Option<PathBuf>,
    /// Skip files and directories with this name, on top of the configured list
    #[arg(long = "exclude", value_name = "NAME", action = ArgAction::Append)]
    pub exclude: Vec<String>,
    /// List the keys that would be written without uploading anything
    #[arg(long)]
    pub dry_run: bool,
    /// Exit with a failure status if any file failed to upload
    #[arg(long)]
    pub fail_on_error: bool,
    /// Never prompt for missing settings
    #[arg(long)]
    pub no_prompt: bool,
    /// More logging (repeatable)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Less logging (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

/// The flags that take part in configuration layering. Unset flags are left
/// out entirely so that they don't shadow files or the environment.
#[derive(Debug, Default, Serialize)]
pub struct Overrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<&'a Prefix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<&'a BucketName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processed_dir: Option<&'a Path>,
}

impl Args {
    pub fn overrides(&self) -> Overrides<'_> {
        Overrides {
            root: self.root.as_deref(),
            prefix: self.prefix.as_ref(),
            bucket: self.bucket.as_ref(),
            region: self.region.as_deref(),
            endpoint: self.endpoint.as_deref(),
            concurrency: self.concurrency,
            processed_dir: self.processed_dir.as_deref(),
        }
    }

    /// Default log level for this crate's targets, before `RUST_LOG`.
    pub fn log_level(&self) -> &'static str {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            ..=-2 => "error",
            -1 => "warn",
            0 => "info",
            1 => "debug",
            2.. => "trace",
        }
    }
}

fn parse_prefix(value: &str) -> Result<Prefix, ConfigErrorKind> {
    Prefix::try_from(value.to_string())
}

fn parse_bucket(value: &str) -> Result<BucketName, ConfigErrorKind> {
    BucketName::try_from(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides_skip_unset() {
        let args = Args::parse_from(["bucketeer", "--prefix", "out/", "--concurrency", "4", "--exclude", "target"]);
        assert_eq!(args.prefix.as_ref().map(Prefix::as_str), Some("out/"));
        assert_eq!(args.exclude, vec!["target".to_string()]);
        let overrides = args.overrides();
        assert_eq!(overrides.concurrency, Some(4));
        assert!(overrides.bucket.is_none());
        assert!(overrides.root.is_none());
    }

    #[rstest]
    #[case(&["bucketeer", "--prefix", "/a/"])]
    #[case(&["bucketeer", "--prefix", "a"])]
    #[case(&["bucketeer", "--bucket", "AB"])]
    #[case(&["bucketeer", "--bucket", "1.2.3.4"])]
    #[case(&["bucketeer", "-v", "-q"])]
    fn test_rejected(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[rstest]
    #[case(&["bucketeer"], "info")]
    #[case(&["bucketeer", "-v"], "debug")]
    #[case(&["bucketeer", "-vvv"], "trace")]
    #[case(&["bucketeer", "-q"], "warn")]
    #[case(&["bucketeer", "-qq"], "error")]
    fn test_log_level(#[case] argv: &[&str], #[case] expected: &str) {
        assert_eq!(Args::parse_from(argv).log_level(), expected);
    }
}
