//! embedgen - Embed binary files into C++ programs
//!
//! This tool reads an input file and transforms it into a C++ header/source
//! pair, so the contents of the original file can be used as constant data
//! without any file I/O at runtime.

use anyhow::{bail, Context, Result};
use clap::Parser;
use embedgen_core::{
    generate_with, resolve_header_path, roundtrip, EmbedSpec, Error, StatsWriter,
    DEFAULT_MAX_CHUNK_BYTES,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;

/// Transform a file into a C++ header/source pair for embedding
#[derive(Parser, Debug)]
#[command(name = "embedgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// The original file for embedding
    #[arg(short = 'f', long = "file", value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Generate the header relative to this include directory
    #[arg(short = 'I', long, default_value = ".", value_name = "INCLUDE_DIR")]
    include_dir: PathBuf,

    /// Output header declaring the generated variables, relative to INCLUDE_DIR
    #[arg(short = 'H', long, value_name = "OUTPUT_HPP_FILE")]
    header: PathBuf,

    /// Output source file defining the generated variables
    #[arg(short = 'C', long, value_name = "OUTPUT_CPP_FILE")]
    source: PathBuf,

    /// Base name for all generated variables
    #[arg(short = 'x', long, value_name = "NAME")]
    name: String,

    /// Generate variables in this namespace
    #[arg(short = 'n', long, value_name = "NAMESPACE")]
    namespace: Option<String>,

    /// Split embedded data into chunks no greater than this size in bytes
    #[arg(
        short = 's',
        long,
        env = "EMBEDGEN_CHUNK_SIZE",
        default_value_t = DEFAULT_MAX_CHUNK_BYTES,
        value_name = "CHUNKSIZE"
    )]
    chunk_size: usize,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - don't write files, just show what would be generated
    #[arg(long)]
    dry_run: bool,

    /// Decode the generated source again and compare it with the input
    #[arg(long)]
    verify: bool,
}

impl Cli {
    fn embed_spec(&self, header_include: String) -> EmbedSpec {
        EmbedSpec::new(self.name.clone())
            .namespace(self.namespace.clone().unwrap_or_default())
            .max_chunk_bytes(self.chunk_size)
            .header_include(header_include)
    }
}

/// Passes reads through while hashing everything that went by
struct HashingReader<R> {
    inner: R,
    hasher: blake3::Hasher,
    bytes_read: u64,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
            bytes_read: 0,
        }
    }

    fn digest(&self) -> blake3::Hash {
        self.hasher.finalize()
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// What happened to an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    Unchanged,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            if is_usage_error(&e) {
                eprintln!("note: see usage with '--help'");
            }
            ExitCode::FAILURE
        }
    }
}

/// True if any cause in the chain is a configuration mistake
fn is_usage_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<Error>()
            .is_some_and(Error::is_usage_error)
    })
}

fn run(cli: &Cli) -> Result<()> {
    let (header_path, header_include) = resolve_header_path(&cli.include_dir, &cli.header)
        .with_context(|| format!("Invalid header path: {}", cli.header.display()))?;

    let spec = cli.embed_spec(header_include);
    spec.validate()?;

    if !cli.input.is_file() {
        bail!("Input path is not a file: {}", cli.input.display());
    }

    let file = fs::File::open(&cli.input)
        .with_context(|| format!("Failed to open input file: {}", cli.input.display()))?;
    let mut reader = HashingReader::new(file);
    let mut stats = StatsWriter::default();

    let artifacts = generate_with(&spec, &mut reader, &mut stats)
        .with_context(|| format!("Failed to embed {}", cli.input.display()))?;

    info!(
        "Embedded {} bytes from {} as {} chunk(s) (largest {} bytes)",
        stats.byte_count,
        cli.input.display(),
        stats.chunk_count,
        stats.largest_chunk
    );
    debug!("Input digest: {}", reader.digest().to_hex());

    match stats.chunk_count {
        0 => warn!(
            "Input {} is empty; the generated arrays have no elements",
            cli.input.display()
        ),
        1 => warn!(
            "Input {} fits in a single chunk of {} bytes",
            cli.input.display(),
            stats.last_chunk
        ),
        _ => {}
    }

    if cli.verify {
        let rebuilt = roundtrip::reconstruct(&artifacts.definition, &spec.identifier)
            .context("Generated source could not be decoded")?;
        let rebuilt_digest = blake3::hash(&rebuilt);
        if rebuilt_digest != reader.digest() || rebuilt.len() as u64 != reader.bytes_read {
            bail!(
                "Verification failed: input {} ({} bytes) vs embedded {} ({} bytes)",
                reader.digest().to_hex(),
                reader.bytes_read,
                rebuilt_digest.to_hex(),
                rebuilt.len()
            );
        }
        info!("Verified round-trip ({})", rebuilt_digest.to_hex());
    }

    if cli.dry_run {
        println!("Would write: {}", header_path.display());
        println!("Would write: {}", cli.source.display());
        println!(
            "{} chunk(s), {} bytes, chunk sizes: {:?}",
            artifacts.num_chunks(),
            artifacts.byte_count(),
            artifacts.chunk_sizes
        );
        return Ok(());
    }

    for (path, content) in [
        (header_path.as_path(), &artifacts.declaration),
        (cli.source.as_path(), &artifacts.definition),
    ] {
        match write_artifact(path, content)? {
            WriteOutcome::Written => println!("Wrote {}", path.display()),
            WriteOutcome::Unchanged => warn!("Unchanged {}, not rewritten", path.display()),
        }
    }

    Ok(())
}

/// Write an artifact through a temporary file and rename it into place.
///
/// Leaves the destination untouched when it already holds `content`.
fn write_artifact(path: &Path, content: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = fs::read(path) {
        if existing == content.as_bytes() {
            trace!("Skipping unchanged {}", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::file_write(path, e))?;
    temp.write_all(content.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| Error::file_write(path, e))?;
    temp.persist(path).map_err(|e| Error::file_write(path, e.error))?;

    Ok(WriteOutcome::Written)
}
