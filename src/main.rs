mod cli;
mod error;
mod prompt;
mod report;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use crate::report::Report;
use bucketeer_config::Config;
use bucketeer_storage::StoreHandle;
use bucketeer_storage::backend::{S3Settings, S3Store};
use bucketeer_transfer::upload::{UploadOptions, upload};
use clap::Parser;
use exn::{OptionExt, ResultExt};
use futures::TryStreamExt;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("bucketeer={}", args.log_level()))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = Config::load_with(args.config.as_deref(), args.overrides()).or_raise(|| ErrorKind::Config)?;
    config.exclude.extend(args.exclude.iter().cloned());

    let interactive = !args.no_prompt && std::io::stdin().is_terminal();
    let bucket = match config.bucket.take() {
        Some(bucket) => bucket,
        None if interactive => prompt::bucket()?,
        None => exn::bail!(ErrorKind::MissingSetting("bucket")),
    };
    let prefix = match config.prefix.take() {
        Some(prefix) => prefix,
        None if interactive => prompt::prefix()?,
        None => exn::bail!(ErrorKind::MissingSetting("prefix")),
    };
    let root = match config.root.take() {
        Some(root) => root,
        None => std::env::current_dir().ok().ok_or_raise(|| ErrorKind::MissingSetting("root"))?,
    };

    let settings = S3Settings {
        bucket: bucket.to_string(),
        region: config.region,
        endpoint: config.endpoint,
        key_id: config.key_id,
        key_secret: config.key_secret,
        path_style: config.path_style,
        multipart_threshold: config.multipart_threshold,
        part_size: config.part_size,
        part_concurrency: config.part_concurrency,
        max_attempts: config.max_attempts,
    };
    let store: StoreHandle = Arc::new(S3Store::new("s3", settings).await);
    let options = UploadOptions {
        concurrency: config.concurrency,
        exclude: config.exclude,
        processed_dir: config.processed_dir,
        dry_run: args.dry_run,
    };
    tracing::info!(bucket = %bucket, prefix = %prefix, root = %root.display(), dry_run = options.dry_run, "Starting upload");

    let mut report = Report::new(std::io::stdout().lock(), options.dry_run);
    let mut events = std::pin::pin!(upload(&store, &root, prefix.as_str(), &options));
    while let Some(event) = events.try_next().await.or_raise(|| ErrorKind::Upload)? {
        report.event(&event).or_raise(|| ErrorKind::Output)?;
    }
    let summary = report.finish().or_raise(|| ErrorKind::Output)?;

    Ok(match args.fail_on_error && summary.failed > 0 {
        true => ExitCode::FAILURE,
        false => ExitCode::SUCCESS,
    })
}

