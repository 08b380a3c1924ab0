//! Command-line entry point for geoingest.
//!
//! `convert` and `list` read local files or remote URLs through HTTP Range
//! requests; `serve` runs the conversion endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use geoingest::cli::{Command, ConvertArgs, ListArgs};
use geoingest::{Cli, Format, HttpRangeReader, LocalFileReader, ReadAt, ZipArchive, server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Convert(args) => convert(&args).await,
        Command::List(args) => list(&args).await,
        Command::Serve(args) => server::serve(args.config()).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// A local file or a remote URL behind HTTP Range requests.
enum Source {
    Local(Arc<LocalFileReader>),
    Remote(Arc<HttpRangeReader>),
}

impl Source {
    async fn open(file: &str, remote: bool) -> Result<Self> {
        if remote {
            Ok(Source::Remote(Arc::new(HttpRangeReader::new(file.to_string()).await?)))
        } else {
            Ok(Source::Local(Arc::new(LocalFileReader::new(Path::new(file))?)))
        }
    }

    fn reader(&self) -> Arc<dyn ReadAt> {
        match self {
            Source::Local(r) => r.clone() as Arc<dyn ReadAt>,
            Source::Remote(r) => r.clone() as Arc<dyn ReadAt>,
        }
    }

    fn report_transfer(&self) {
        if let Source::Remote(r) = self {
            info!(
                transferred = %format_size(r.transferred_bytes()),
                of = %format_size(r.size()),
                "remote read complete"
            );
        }
    }
}

async fn convert(args: &ConvertArgs) -> Result<()> {
    let format = Format::from_file_name(args.format_name())?;
    let source = Source::open(&args.file, args.is_http_url()).await?;

    let collection = geoingest::convert_source(format, source.reader()).await?;
    source.report_transfer();
    info!(
        format = format.label(),
        features = collection.features.len(),
        "converted"
    );

    let json = if args.pretty {
        serde_json::to_vec_pretty(&collection)?
    } else {
        serde_json::to_vec(&collection)?
    };

    match &args.output {
        Some(path) => tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("Cannot write {}", path.display()))?,
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&json).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// List the members of an archive.
///
/// The verbose table shows sizes, compression ratio and timestamps.
async fn list(args: &ListArgs) -> Result<()> {
    let source = Source::open(&args.file, args.is_http_url()).await?;
    let archive = ZipArchive::new(source.reader());
    let entries = archive.list_files().await?;

    if args.verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if !args.verbose {
            println!("{}", entry.file_name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if args.verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    source.report_transfer();
    Ok(())
}

/// Percentage saved by compression, right-aligned to five columns.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "   0%".to_string()
    }
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
