use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "policyseg",
    version,
    about = "Insurance policy text segmentation and category normalization tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Segment(SegmentArgs),
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// Extracted-text files, one document per file.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Document family key used to resolve the heading dialect.
    #[arg(long)]
    pub family: String,

    /// Overrides the document id; only valid with a single input.
    #[arg(long)]
    pub doc_id: Option<String>,

    #[arg(long, default_value = ".cache/policyseg")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// JSON array of chunk records carrying a raw category answer.
    #[arg(long)]
    pub chunks_path: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// JSON array of taxonomy labels; defaults to the builtin taxonomy.
    #[arg(long)]
    pub taxonomy_path: Option<PathBuf>,

    /// Name of the field holding the raw classification answer.
    #[arg(long, default_value = "category")]
    pub field: String,

    #[arg(long, default_value = ".cache/policyseg")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}
