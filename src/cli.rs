use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::ChainPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "hocr-columns",
    version,
    about = "Reading-order line reconstruction for multi-column HOCR output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// HOCR file produced by the OCR engine.
    pub hocr_path: PathBuf,

    /// Defaults to the directory containing the HOCR file.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON file with column detection settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub expected_column_count: Option<usize>,

    #[arg(long)]
    pub in_column_fraction: Option<f64>,

    #[arg(long)]
    pub min_line_length: Option<usize>,

    #[arg(long)]
    pub allow_lowercase_start: bool,

    #[arg(long, value_enum)]
    pub chain_policy: Option<ChainPolicyArg>,

    #[arg(long, default_value_t = false)]
    pub ndjson: bool,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ChainPolicyArg {
    UnsnappedOnly,
    AllAssigned,
}

impl From<ChainPolicyArg> for ChainPolicy {
    fn from(value: ChainPolicyArg) -> Self {
        match value {
            ChainPolicyArg::UnsnappedOnly => Self::UnsnappedOnly,
            ChainPolicyArg::AllAssigned => Self::AllAssigned,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Directory holding a previous extract run.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}
