use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use hashobj_core::{
    Error, HashOnly, Ingester, Mode, ObjectDatabase, Options, RootContext, RunConfig,
    STORE_DIR_ENV, Store, discover_root,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};

mod logging;

/// Exit status for invalid option combinations.
const EXIT_USAGE: u8 = 129;

/// Exit status for any failure while processing inputs.
const EXIT_FATAL: u8 = 128;

/// Compute object ids and optionally write objects into the store
#[derive(Parser)]
#[command(name = "hashobj")]
#[command(
    about = "Compute an object id for files or stdin, optionally writing them into the store",
    long_about = None
)]
#[command(override_usage = "hashobj [-t <type>] [-w] [--path=<file>|--no-filters] [--stdin] [--] <file>...\n       hashobj --stdin-paths < <list-of-paths>")]
#[command(version)]
struct Cli {
    /// Object type
    #[arg(short = 't', value_name = "type", default_value = "blob")]
    object_type: String,

    /// Write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Read the object from stdin
    #[arg(long, action = ArgAction::Count)]
    stdin: u8,

    /// Read file names from stdin
    #[arg(long)]
    stdin_paths: bool,

    /// Store file as is without filters
    #[arg(long)]
    no_filters: bool,

    /// Process file as if it were from this path
    #[arg(long, value_name = "file")]
    path: Option<String>,

    /// Files to hash
    #[arg(value_name = "file")]
    files: Vec<String>,
}

impl Cli {
    fn into_options(self) -> Options {
        Options {
            object_type: Some(self.object_type),
            write: self.write,
            stdin: self.stdin,
            stdin_paths: self.stdin_paths,
            no_filters: self.no_filters,
            path: self.path,
            files: self.files,
        }
    }
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report(&err)),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::from_options(cli.into_options())?;
    debug!(?config, "validated options");

    if config.mode == Mode::Stdin && atty::is(atty::Stream::Stdin) {
        warn!("reading object content from a terminal; end input with EOF");
    }

    if !config.write {
        return ingest(&config, None, &HashOnly);
    }

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let explicit = std::env::var_os(STORE_DIR_ENV).map(PathBuf::from);
    let root = discover_root(&cwd, explicit.as_deref()).ok_or_else(|| Error::not_a_store(&cwd))?;

    let store = Store::open(root.store_dir())
        .with_context(|| format!("Failed to open store at {}", root.store_dir().display()))?;

    ingest(&config, Some(&root), &store)
}

fn ingest(config: &RunConfig, root: Option<&RootContext>, db: &dyn ObjectDatabase) -> Result<()> {
    let stdin = io::stdin();
    let mut ingester = Ingester::new(config, root, db, io::stdout().lock());
    ingester.run(stdin.lock())?;
    Ok(())
}

/// Print the failure and pick the exit status.
fn report(err: &anyhow::Error) -> u8 {
    let usage = err.downcast_ref::<Error>().is_some_and(Error::is_usage);

    if usage {
        eprintln!("error: {}", err);
        eprintln!("{}", Cli::command().render_usage());
        EXIT_USAGE
    } else {
        eprintln!("fatal: {:#}", err);
        EXIT_FATAL
    }
}
