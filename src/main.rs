use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xnbdec::container::{Container, ExportOptions};

/// Input name that selects standard input.
const STDIN_NAME: &str = "-";

#[derive(Parser)]
#[command(name = "xnbdec", version, about = "Decode XNB container FILE(s) or standard input")]
struct Cli {
    /// Treat the single FILE argument as a list of input files, one per line
    #[arg(short, long)]
    file: bool,
    /// Suppress output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
    /// Print information about the container (default action)
    #[arg(short, long)]
    list: bool,
    /// Print container information as JSON
    #[arg(long)]
    json: bool,
    /// Export the container's object(s), optionally under BASENAME
    /// (only allowed with a single input file)
    #[arg(short, long, value_name = "BASENAME", num_args = 0..=1, require_equals = true)]
    export: Option<Option<String>>,
    /// Prepend this directory to all output filenames
    #[arg(short, long, value_name = "DIR")]
    output_prefix: Option<PathBuf>,
    /// Input files; `-` or none reads standard input
    files: Vec<PathBuf>,
}

impl Cli {
    fn wants_list(&self) -> bool {
        self.list || self.json || self.export.is_none()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let inputs = collect_inputs(&cli)?;
    if let Some(Some(_)) = &cli.export {
        if inputs.len() > 1 {
            return Err("an export basename may not be given with multiple input files".into());
        }
    }

    let mut failures = 0usize;
    for (i, path) in inputs.iter().enumerate() {
        if !cli.quiet {
            println!("Loading file {}/{}: {}", i + 1, inputs.len(), path.display());
        }
        if let Err(e) = process(&cli, path) {
            error!(path = %path.display(), error = %e, "failed");
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} input(s) failed", inputs.len()).into());
    }
    Ok(())
}

// ── Driver ───────────────────────────────────────────────────────────────────

fn process(cli: &Cli, path: &Path) -> Result<(), Box<dyn Error>> {
    let cont = if path.as_os_str() == STDIN_NAME {
        Container::read(io::stdin().lock())?
    } else {
        xnbdec::container::read_file(path)?
    };
    info!(path = %path.display(), objects = cont.objects().count(), "decoded container");

    if cli.wants_list() && !cli.quiet {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&cont)?);
        } else {
            print!("{}", cont.describe());
        }
    }

    let mut export_failed = false;
    if let Some(basename) = &cli.export {
        let opts = export_options(path, basename.as_deref(), cli.output_prefix.as_deref());
        for result in cont.export_all(&opts) {
            match result.outcome {
                Ok(out) => {
                    if !cli.quiet {
                        println!("Exported {} to {}", result.slot, out.display());
                    }
                }
                Err(e) => {
                    error!(slot = %result.slot, error = %e, "couldn't export");
                    export_failed = true;
                }
            }
        }
    }

    cont.release();
    if export_failed {
        return Err("one or more objects could not be exported".into());
    }
    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if cli.file {
        let [list] = cli.files.as_slice() else {
            return Err("only a single input file may be used with --file".into());
        };
        return Ok(read_file_list(BufReader::new(File::open(list)?))?);
    }
    if cli.files.is_empty() {
        return Ok(vec![PathBuf::from(STDIN_NAME)]);
    }
    Ok(cli.files.clone())
}

/// One path per line; surrounding whitespace and blank lines are ignored.
fn read_file_list<R: BufRead>(reader: R) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            files.push(PathBuf::from(line));
        }
    }
    Ok(files)
}

/// Without a basename, outputs are named after the input with any `.xnb`
/// extension removed; they land beside the input unless a prefix is given,
/// in which case only the file name is kept.
fn export_options(input: &Path, basename: Option<&str>, prefix: Option<&Path>) -> ExportOptions {
    let basename = match basename {
        Some(b) => PathBuf::from(b),
        None if input.as_os_str() == STDIN_NAME => PathBuf::from("stdin"),
        None => {
            let stem = match input.extension() {
                Some(ext) if ext.eq_ignore_ascii_case("xnb") => input.with_extension(""),
                _ => input.to_path_buf(),
            };
            match prefix {
                Some(_) => stem.file_name().map(PathBuf::from).unwrap_or(stem),
                None    => stem,
            }
        }
    };
    let opts = ExportOptions::new(basename);
    match prefix {
        Some(dir) => opts.with_prefix(dir),
        None      => opts,
    }
}
