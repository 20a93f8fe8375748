//! tokens - design-token translator and CI lint suite
//!
//! Usage: tokens [OPTIONS] <command>
//!
//! Exit status: 0 when clean, 1 when a check found problems, 2 on a fatal error
//! (unreadable token document, I/O failure).

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::bullets::normalize_with_report;
use tailor_api::config::TokenPaths;
use tailor_api::errors::TokenError;
use tailor_api::tokens::checks::{load_consumers, orphan_tokens, run_checks};
use tailor_api::tokens::lockfile::{generate_lockfile, validate_lockfile};
use tailor_api::tokens::{render_artifacts, write_artifacts, TokenDocument, Translation};

#[derive(Parser)]
#[command(name = "tokens")]
#[command(about = "Design-token translation and stylesheet lint suite", version)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PathArgs {
    /// Design token document
    #[arg(long = "tokens", env = "DESIGN_TOKENS_PATH", default_value = "design_tokens.json", global = true)]
    token_file: PathBuf,

    /// Root of the hand-written stylesheets
    #[arg(long, env = "STYLES_ROOT", default_value = "styles", global = true)]
    styles_root: PathBuf,

    /// Directory receiving generated artifacts
    #[arg(long, env = "GENERATED_STYLES_DIR", default_value = "styles/generated", global = true)]
    out_dir: PathBuf,

    /// Import lockfile
    #[arg(long, env = "IMPORT_LOCKFILE", default_value = "styles/imports.lock", global = true)]
    lockfile: PathBuf,

    /// Consumer manifest listing stylesheets and renderer sources
    #[arg(long, env = "TOKEN_CONSUMERS_MANIFEST", default_value = "token-consumers.json", global = true)]
    manifest: PathBuf,

    /// Base font size (pt) for em/rem conversion in DOCX output
    #[arg(long, env = "DOCX_BASE_FONT_PT", default_value = "11", global = true)]
    base_font_pt: f32,
}

impl From<PathArgs> for TokenPaths {
    fn from(args: PathArgs) -> Self {
        TokenPaths {
            token_file: args.token_file,
            styles_root: args.styles_root,
            output_dir: args.out_dir,
            lockfile: args.lockfile,
            manifest: args.manifest,
            base_font_pt: args.base_font_pt,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate variable files and spacing artifacts from the token document
    Build,

    /// List tokens no declared consumer references
    Orphans,

    /// Regenerate the import lockfile
    Lock,

    /// Verify the import lockfile against the stylesheets on disk
    VerifyLock,

    /// Run every lint check (manifest, orphans, lockfile, generated drift)
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize résumé bullets (arguments, or one per stdin line)
    Normalize {
        /// Bullets to normalize; reads stdin when empty
        bullets: Vec<String>,
    },
}

/// Non-fatal result of a command.
enum Status {
    Clean,
    Findings,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("tailor_api={level},tokens={level}"))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths = TokenPaths::from(cli.paths);
    match run(cli.command, &paths) {
        Ok(Status::Clean) => ExitCode::SUCCESS,
        Ok(Status::Findings) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Command, paths: &TokenPaths) -> Result<Status> {
    match command {
        Command::Build => build(paths),
        Command::Orphans => orphans(paths),
        Command::Lock => lock(paths),
        Command::VerifyLock => verify_lock(paths),
        Command::Check { json } => check(paths, json),
        Command::Normalize { bullets } => normalize(bullets),
    }
}

fn build(paths: &TokenPaths) -> Result<Status> {
    let document = TokenDocument::load(&paths.token_file)?;
    let translation = Translation::from_document(&document, paths.base_font_pt);
    for key in &translation.skipped {
        warn!("Skipped spacing token '{key}': no CSS property could be derived");
    }

    let written = write_artifacts(&paths.output_dir, &render_artifacts(&translation))?;
    info!(
        "Generated {} artifact(s), {} spacing selector(s)",
        written.len(),
        translation.screen.len()
    );
    Ok(Status::Clean)
}

fn orphans(paths: &TokenPaths) -> Result<Status> {
    let document = TokenDocument::load(&paths.token_file)?;
    let consumers = load_consumers(paths)?;
    for missing in &consumers.missing {
        warn!("Declared consumer does not exist: {}", missing.display());
    }

    let orphans = orphan_tokens(&document, &consumers);
    if orphans.is_empty() {
        println!("no orphan tokens");
        return Ok(Status::Clean);
    }
    for path in &orphans {
        println!("{path}");
    }
    Ok(Status::Findings)
}

fn lock(paths: &TokenPaths) -> Result<Status> {
    match generate_lockfile(&paths.styles_root, &paths.lockfile) {
        Ok(lockfile) => {
            println!(
                "locked {} import(s) in {}",
                lockfile.entries.len(),
                paths.lockfile.display()
            );
            Ok(Status::Clean)
        }
        Err(TokenError::UnresolvedImports(unresolved)) => {
            for import in &unresolved {
                println!("unresolved import: {import}");
            }
            println!("lockfile not written");
            Ok(Status::Findings)
        }
        Err(e) => Err(e.into()),
    }
}

fn verify_lock(paths: &TokenPaths) -> Result<Status> {
    let report = validate_lockfile(&paths.styles_root, &paths.lockfile)?;

    for path in &report.missing_files {
        println!("missing file: {}", path.display());
    }
    for path in &report.changed_files {
        println!("changed file: {}", path.display());
    }
    for path in &report.unreadable_files {
        println!("unreadable file: {}", path.display());
    }
    for import in &report.unresolved_imports {
        println!("unresolved import: {import}");
    }
    for path in &report.untracked_files {
        warn!("Untracked dependency: {}", path.display());
    }

    if report.passed() {
        println!("lockfile ok ({} file(s) checked)", report.checked);
        Ok(Status::Clean)
    } else {
        Ok(Status::Findings)
    }
}

fn check(paths: &TokenPaths, json: bool) -> Result<Status> {
    let report = run_checks(paths)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing check report")?
        );
    } else {
        for outcome in &report.outcomes {
            let mark = if outcome.passed { "ok" } else { "FAIL" };
            println!("[{mark}] {}", outcome.name);
            for finding in &outcome.findings {
                println!("    {finding}");
            }
            for warning in &outcome.warnings {
                println!("    warning: {warning}");
            }
        }
    }

    Ok(if report.passed() {
        Status::Clean
    } else {
        Status::Findings
    })
}

fn normalize(bullets: Vec<String>) -> Result<Status> {
    let bullets = if bullets.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("reading bullets from stdin")?
    } else {
        bullets
    };

    for bullet in &bullets {
        let report = normalize_with_report(bullet);
        for change in &report.changes {
            info!("{change:?}");
        }
        println!("{}", report.text);
    }
    Ok(Status::Clean)
}
