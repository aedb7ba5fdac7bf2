use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "openapi2kong")]
#[command(about = "Convert OpenAPI 3 documents into Kong declarative configuration")]
pub struct Cli {
    /// Log verbosity: 0 warn, 1 info, 2 debug, 3 or more trace. `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value_t = 0)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Convert one OpenAPI document into a Kong declarative config.
    Convert(ConvertArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// OpenAPI document (YAML or JSON), `-` for stdin.
    #[arg(long)]
    pub spec: PathBuf,
    /// Output file path, `-` for stdout.
    #[arg(long, default_value = "-")]
    pub output_file: PathBuf,
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
    /// Tag added to every generated entity. Repeatable, order is kept.
    #[arg(long = "select-tag")]
    pub select_tags: Vec<String>,
    /// Derive request-validator plugins from operation schemas.
    #[arg(long)]
    pub validator: bool,
    /// Optional TOML file with conversion options.
    #[arg(long)]
    pub options_file: Option<PathBuf>,
    /// Document name used to scope generated ids.
    #[arg(long)]
    pub doc_name: Option<String>,
    /// Suppress the summary line.
    #[arg(short, long)]
    pub quiet: bool,
}

impl ConvertArgs {
    pub fn reads_stdin(&self) -> bool {
        self.spec.as_os_str() == "-"
    }

    pub fn writes_stdout(&self) -> bool {
        self.output_file.as_os_str() == "-"
    }
}
