use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use recstream_codec::{CodecConfig, RecordCodec, UnknownCategoryPolicy};
use recstream_encoder::RecordEncoder;
use recstream_stream::{ArrayStream, MergedStream, RecordStream, TypedStream};
use recstream_types::RecordKind;
use tracing::{debug, info};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let codec = load_codec(cli.config.as_deref(), cli.lenient)?;
    match cli.command {
        Command::Validate(args) => cmd_validate(args, &codec),
        Command::Dump(args) => cmd_dump(args, &codec),
    }
}

fn load_codec(path: Option<&Path>, lenient: bool) -> anyhow::Result<RecordCodec> {
    let mut config = match path {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("failed to load codec config {}", path.display()))?,
        None => CodecConfig::default(),
    };
    if lenient {
        config.unknown_category = UnknownCategoryPolicy::Preserve;
    }
    debug!(?config, "codec configuration");
    Ok(RecordCodec::new(config))
}

fn cmd_validate(args: ValidateArgs, codec: &RecordCodec) -> anyhow::Result<()> {
    let count = validate_file(&args.path, args.max_records, codec)?;
    println!(
        "{} {} ({} records)",
        "✓".green().bold(),
        args.path.display().to_string().bold(),
        count.to_string().cyan()
    );
    Ok(())
}

fn cmd_dump(args: DumpArgs, codec: &RecordCodec) -> anyhow::Result<()> {
    let codec = if args.pretty {
        let mut config = codec.config().clone();
        config.pretty = true;
        RecordCodec::new(config)
    } else {
        codec.clone()
    };
    let stdout = std::io::stdout();
    let written = dump_to(&args.paths, args.category, &codec, stdout.lock())?;
    info!(records = written, files = args.paths.len(), "dump complete");
    Ok(())
}

/// Stream every record in `path`, stopping after `max_records` if given.
/// Returns the number of records read. An empty file fails validation.
pub fn validate_file(
    path: &Path,
    max_records: Option<u64>,
    codec: &RecordCodec,
) -> anyhow::Result<u64> {
    let mut stream = ArrayStream::open(path, codec.clone())
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut count = 0u64;
    while max_records.map_or(true, |max| count < max) {
        let next = stream
            .pull()
            .with_context(|| format!("{}: record {} is invalid", path.display(), count + 1))?;
        match next {
            Some(_) => count += 1,
            None => break,
        }
    }
    stream.close()?;
    if count == 0 {
        bail!("{}: at least one record required", path.display());
    }
    debug!(path = %path.display(), records = count, "validated");
    Ok(count)
}

/// Concatenate `paths`, keep records of `kind` if given, and write them to
/// `out` as one JSON array. Returns the number of records written.
pub fn dump_to<W: Write>(
    paths: &[PathBuf],
    kind: Option<RecordKind>,
    codec: &RecordCodec,
    out: W,
) -> anyhow::Result<u64> {
    let mut streams: Vec<Box<dyn RecordStream>> = Vec::with_capacity(paths.len());
    for path in paths {
        let stream = ArrayStream::open(path, codec.clone())
            .with_context(|| format!("failed to open {}", path.display()))?;
        streams.push(Box::new(stream));
    }
    let merged = MergedStream::new(streams);
    let source: Box<dyn RecordStream> = match kind {
        Some(kind) => Box::new(TypedStream::new(merged, kind)),
        None => Box::new(merged),
    };

    let mut encoder = RecordEncoder::new(source, codec.clone());
    let result = encoder.write_all_to(out);
    let closed = encoder.close();
    result.context("failed to encode records")?;
    closed.context("failed to close inputs")?;
    Ok(encoder.records_written())
}
