//! amalgam CLI

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use amalgam_core::amalgamate::{self, Amalgamation, Amalgamator, VisitedDocument};
use amalgam_core::banner::{generation_time, query_revision, Banner, UNKNOWN_REVISION};
use amalgam_core::config::{AmalgamConfig, CONFIG_FILE_NAME};
use amalgam_core::output::{write_json_pretty, write_ndjson};
use amalgam_core::source::{unreached, FsSource};

/// CLI entrypoint for amalgam.
#[derive(Debug, Parser)]
#[command(
    name = "amalgam",
    about = "Merge a header-only library into a single distributable header"
)]
pub struct Cli {
    /// Project config file (defaults to ./amalgam.toml when present)
    #[arg(long, global = true, env = "AMALGAM_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the single header (default when no command is given)
    Build(BuildArgs),
    /// Show which headers the entry pulls in, without writing anything
    List(ListArgs),
}

#[derive(Debug, Default, Args)]
struct SourceArgs {
    /// Root header, relative to the include root
    #[arg(long = "entry", value_hint = ValueHint::Other)]
    entry: Option<String>,

    /// Directory holding the library headers
    #[arg(long = "include-root", value_hint = ValueHint::DirPath)]
    include_root: Option<PathBuf>,

    /// Include targets starting with this prefix are inlined
    #[arg(long = "prefix", value_hint = ValueHint::Other)]
    prefix: Option<String>,

    /// Omit the begin/end comment markers around each header
    #[arg(long = "no-markers", action = ArgAction::SetTrue)]
    no_markers: bool,
}

#[derive(Debug, Default, Args)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Destination of the merged header
    #[arg(short = 'o', long = "output", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Revision string for the banner instead of asking git
    #[arg(long = "revision", value_hint = ValueHint::Other)]
    revision: Option<String>,

    /// Compile (and run) the configured test sources against the result
    #[arg(long = "smoke-test", action = ArgAction::SetTrue)]
    smoke_test: bool,
}

#[derive(Debug, Default, Args)]
struct ListArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// List prefixed headers under the include root that the entry never reaches
    #[arg(long = "unreached", action = ArgAction::SetTrue, conflicts_with_all = ["json", "ndjson"])]
    unreached: bool,
}

/// Config plus the directory its relative paths resolve against.
#[derive(Debug, Clone)]
struct Settings {
    config: AmalgamConfig,
    base: PathBuf,
    cwd: PathBuf,
}

impl Settings {
    fn entry(&self, args: &SourceArgs) -> String {
        args.entry.clone().unwrap_or_else(|| self.config.entry.clone())
    }

    fn include_root(&self, args: &SourceArgs) -> PathBuf {
        match &args.include_root {
            Some(root) => self.cwd.join(root),
            None => self.config.include_root_in(&self.base),
        }
    }

    fn options(&self, args: &SourceArgs) -> amalgamate::AmalgamOptions {
        let mut options = self.config.options();
        if let Some(prefix) = &args.prefix {
            options.local_prefix = prefix.clone();
        }
        if args.no_markers {
            options.markers = false;
        }
        options
    }

    fn output(&self, args: &BuildArgs) -> PathBuf {
        match &args.output {
            Some(out) => self.cwd.join(out),
            None => self.config.output_in(&self.base),
        }
    }

    fn banner(&self, revision: String) -> Banner {
        let banner = &self.config.banner;
        Banner {
            title: banner.title.clone(),
            url: banner.url.clone(),
            license: banner.license.clone(),
            version: banner.version.clone(),
            revision,
            generated: generation_time(),
        }
    }
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = env::current_dir().context("cannot determine working directory")?;
    let settings = resolve_settings(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Some(Command::Build(args)) => run_build(&settings, &args),
        Some(Command::List(args)) => run_list(&settings, &args),
        None => run_build(&settings, &BuildArgs::default()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn resolve_settings(explicit: Option<&Path>, cwd: &Path) -> Result<Settings> {
    let path = match explicit {
        Some(path) => {
            let path = cwd.join(path);
            if !path.is_file() {
                return Err(anyhow!("config file not found: {}", path.display()));
            }
            path
        }
        None => cwd.join(CONFIG_FILE_NAME),
    };

    let config = AmalgamConfig::load(&path)?;
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());

    Ok(Settings {
        config,
        base,
        cwd: cwd.to_path_buf(),
    })
}

fn run_build(settings: &Settings, args: &BuildArgs) -> Result<()> {
    let entry = settings.entry(&args.source);
    let include_root = settings.include_root(&args.source);
    let output = settings.output(args);
    let options = settings.options(&args.source);

    let revision = match &args.revision {
        Some(rev) => rev.clone(),
        None => query_revision(&settings.base).unwrap_or_else(|| UNKNOWN_REVISION.to_owned()),
    };
    info!(%revision, "current revision");

    let banner = settings.banner(revision);
    let merged = amalgamate::run(&entry, &include_root, &output, &banner, &options)
        .with_context(|| format!("failed to amalgamate {entry}"))?;

    warn_unreached(&include_root, &options.local_prefix, &merged);

    if args.smoke_test {
        settings
            .config
            .smoke
            .to_smoke_test(&settings.base)
            .execute(&output)
            .context("generated header failed its smoke test")?;
        info!("smoke test passed");
    }

    Ok(())
}

fn warn_unreached(include_root: &Path, prefix: &str, merged: &Amalgamation) {
    match FsSource::new(include_root).documents(prefix) {
        Ok(all) => {
            for id in unreached(&all, merged.document_ids()) {
                warn!(document = %id, "header is never included from the entry");
            }
        }
        Err(err) => warn!(error = %err, "could not scan include root"),
    }
}

fn run_list(settings: &Settings, args: &ListArgs) -> Result<()> {
    let entry = settings.entry(&args.source);
    let include_root = settings.include_root(&args.source);
    let options = settings.options(&args.source);
    let prefix = options.local_prefix.clone();

    let source = FsSource::new(&include_root);
    let banner = settings.banner(UNKNOWN_REVISION.to_owned());
    let merged = Amalgamator::new(&source, options)
        .amalgamate(&entry, &banner)
        .with_context(|| format!("failed to amalgamate {entry}"))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.unreached {
        let all = source.documents(&prefix)?;
        for id in unreached(&all, merged.document_ids()) {
            writeln!(handle, "{id}")?;
        }
    } else if args.ndjson {
        write_ndjson(&merged.documents, &mut handle)?;
    } else if args.json {
        write_json_pretty(&merged.documents, &mut handle)?;
    } else {
        write_tree(&merged.documents, &mut handle)?;
    }

    Ok(())
}

fn write_tree(docs: &[VisitedDocument], mut w: impl Write) -> Result<()> {
    for doc in docs {
        writeln!(w, "{:indent$}{}", "", doc.id, indent = doc.depth * 2)?;
    }
    Ok(())
}
