//! bucket CLI - Command line interface for bucketfs
//!
//! Runs blob operations against any bucket the registry can resolve, e.g.
//! `bucket --url file:///var/data ls '**/*.csv'`.

use bucketfs::path::normalize;
use bucketfs::{Bucket, BucketExt, CreateOptions, DEFAULT_PATTERN};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bucket")]
#[command(about = "Uniform blob operations over filesystem, object-store and in-memory buckets")]
#[command(version)]
struct Cli {
    /// Connection URL of the bucket (e.g. file:///var/data, s3://name?region=eu-west-1)
    #[arg(short, long, env = "BUCKET_URL")]
    url: String,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// List blobs matching a glob pattern
    Ls {
        /// Glob pattern; `*` stays within a segment, `**` crosses segments
        #[arg(default_value = DEFAULT_PATTERN)]
        pattern: String,
    },

    /// Show blob metadata
    Info {
        /// Blob path
        path: String,
    },

    /// Write a blob's content to stdout
    Cat {
        /// Blob path
        path: String,
    },

    /// Write a blob atomically from a file or stdin
    Put {
        /// Blob path
        path: String,
        /// Read content from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Content type to record
        #[arg(long)]
        content_type: Option<String>,
        /// Metadata entry, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },

    /// Remove a blob (missing blobs are not an error)
    Rm {
        /// Blob path
        path: String,
    },

    /// Copy a blob
    Cp {
        /// Source path
        src: String,
        /// Destination path
        dst: String,
    },

    /// Move a blob
    Mv {
        /// Source path
        src: String,
        /// Destination path
        dst: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "message": err.to_string()
            }),
        );
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let bucket = bucketfs::resolve(&cli.url)?;

    match &cli.command {
        Commands::Ls { pattern } => {
            let keys = bucket.list(pattern)?;
            match cli.format {
                OutputFormat::Json => output(&cli.format, &serde_json::json!({ "keys": keys })),
                OutputFormat::Text => {
                    for key in keys {
                        println!("{key}");
                    }
                }
            }
        }

        Commands::Info { path } => {
            let info = bucket.info(path)?;
            output(&cli.format, &serde_json::to_value(info)?);
        }

        Commands::Cat { path } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            bucket.read_with(path, |reader| {
                io::copy(reader, &mut out)?;
                Ok(())
            })?;
            out.flush()?;
        }

        Commands::Put {
            path,
            file,
            content_type,
            meta,
        } => {
            let key = normalize(path)?;
            let mut options = CreateOptions::new().metadata(meta.iter().cloned().collect());
            options.content_type = content_type.clone();

            let mut input: Box<dyn Read> = match file {
                Some(file) => Box::new(File::open(file)?),
                None => Box::new(io::stdin()),
            };
            let size = bucket.write_with(&key, &options, |writer| {
                Ok(io::copy(&mut input, writer)?)
            })?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "path": key,
                    "size": size
                }),
            );
        }

        Commands::Rm { path } => {
            let key = normalize(path)?;
            bucket.rm(&key)?;
            output(&cli.format, &serde_json::json!({ "status": "ok", "path": key }));
        }

        Commands::Cp { src, dst } => {
            let (src, dst) = (normalize(src)?, normalize(dst)?);
            bucket.cp(&src, &dst)?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "src": src, "dst": dst }),
            );
        }

        Commands::Mv { src, dst } => {
            let (src, dst) = (normalize(src)?, normalize(dst)?);
            bucket.mv(&src, &dst)?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "src": src, "dst": dst }),
            );
        }
    }

    Ok(())
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    if let Ok(rendered) = rendered {
        println!("{rendered}");
    }
}
