//! Command-line interface of the `mati` binary.
//!
//! The binary is a thin caller around the library: it loads the configuration,
//! polls the selected providers one after another and prints a JSON report.

use clap::Parser;
use std::path::PathBuf;

/// Poll configured content providers and print what they return.
///
/// # Examples
///
/// ```sh
/// # Every provider in ./libmati.yaml
/// mati
///
/// # Two providers, report written to a file
/// mati -c /etc/libmati.yaml -p repostuj_popular -p mikroblog_hot -o out/report.json
///
/// # One item through a given provider
/// mati -p mikroblog_hot --single https://wykop.pl/wpis/12345
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "LIBMATI_CONFIG", default_value = "libmati.yaml")]
    pub config: PathBuf,

    /// Provider ids to poll (repeatable). Defaults to every configured provider
    #[arg(short, long = "provider")]
    pub providers: Vec<String>,

    /// Fetch a single item by URL instead of polling; requires exactly one --provider
    #[arg(short, long)]
    pub single: Option<String>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
