use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use recstream_types::RecordKind;

#[derive(Parser)]
#[command(
    name = "recstream",
    about = "Stream, validate, and re-encode polymorphic JSON record files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Codec configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep records with unrecognised categories instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that a file decodes as a stream of records
    Validate(ValidateArgs),
    /// Concatenate files, optionally filter by category, and re-encode
    Dump(DumpArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    pub path: PathBuf,
    /// Stop after this many records
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_records: Option<u64>,
}

#[derive(Args)]
pub struct DumpArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Only emit records of this category and its sub-categories
    #[arg(long)]
    pub category: Option<RecordKind>,
    #[arg(long)]
    pub pretty: bool,
}
