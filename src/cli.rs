use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::server::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "geoingest")]
#[command(version)]
#[command(about = "Convert geospatial files to GeoJSON, locally, over HTTP ranges, or as a service", long_about = None)]
#[command(after_help = "Examples:\n  \
  geoingest convert trails.gpx --pretty             print a GPX file as GeoJSON\n  \
  geoingest convert https://example.com/parcels.zip -o parcels.geojson\n  \
  geoingest list -v site.kmz                        list the members of a KMZ\n  \
  geoingest serve --bind 127.0.0.1:8080             run the conversion endpoint")]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "GEOINGEST_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a file or URL to a GeoJSON FeatureCollection
    Convert(ConvertArgs),

    /// List the members of a KMZ or zipped shapefile
    List(ListArgs),

    /// Serve the conversion endpoint over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// File path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Name used to detect the format (defaults to FILE)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,
}

impl ConvertArgs {
    pub fn is_http_url(&self) -> bool {
        is_http_url(&self.file)
    }

    /// The name whose extension selects the converter.
    ///
    /// Query strings and fragments are ignored for URLs.
    pub fn format_name(&self) -> &str {
        if let Some(name) = &self.name {
            return name;
        }
        if self.is_http_url() {
            return self
                .file
                .split(['?', '#'])
                .next()
                .unwrap_or(&self.file);
        }
        &self.file
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Archive path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List verbosely with sizes and timestamps
    #[arg(short = 'v')]
    pub verbose: bool,
}

impl ListArgs {
    pub fn is_http_url(&self) -> bool {
        is_http_url(&self.file)
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "GEOINGEST_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Largest request body accepted, in bytes
    #[arg(long, env = "GEOINGEST_MAX_BODY_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl ServeArgs {
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

fn is_http_url(file: &str) -> bool {
    file.starts_with("http://") || file.starts_with("https://")
}
