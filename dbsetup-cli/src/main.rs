//! dbsetup CLI
//!
//! Command-line front end for provisioning a database from a dbsetup schema
//! document: create, clear, drop, recreate, or export a snapshot.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dbsetup::postgres::PostgresConnector;
use dbsetup::{
    DbSetupConfig, SchemaDocument, SchemaEngine, SetupOptions, SetupReport, SqlLogLevel,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "dbsetup")]
#[command(about = "Declarative schema and seed-data provisioning")]
#[command(version = "0.1.0")]
struct Cli {
    /// Schema document (XML)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Settings file
    #[arg(long, global = true, default_value = dbsetup::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Database connection URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Database user
    #[arg(long, global = true)]
    user: Option<String>,

    /// Database password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Statement log mode: none, all or sql
    #[arg(long, global = true)]
    log: Option<SqlLogLevel>,

    /// Write the statement log to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Type map overrides (TOML)
    #[arg(long, global = true)]
    typemap: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct SetupArgs {
    /// Only process this table
    #[arg(long)]
    table: Option<String>,

    /// Load data into existing tables without creating anything
    #[arg(long)]
    data_only: bool,

    /// Delete existing rows of --table before loading data
    #[arg(long)]
    delete_first: bool,
}

impl From<SetupArgs> for SetupOptions {
    fn from(args: SetupArgs) -> Self {
        SetupOptions {
            table: args.table,
            data_only: args.data_only,
            delete_first: args.delete_first,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, indexes and views, then load seed data
    Setup(SetupArgs),

    /// Delete all rows, keeping the schema
    Clear {
        /// Only clear this table
        #[arg(long)]
        table: Option<String>,
    },

    /// Drop views and tables
    Uninstall,

    /// Drop everything, then set it up again
    UninstallSetup(SetupArgs),

    /// Write a snapshot of every live table to an XML file
    Export {
        /// Output file
        output: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(true) => {
            if !cli.quiet {
                println!("{}", "OK".green().bold());
            }
            process::exit(0);
        }
        Ok(false) => {
            eprintln!("{}", "NOT OK".red().bold());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Run the selected command; `Ok(false)` means it completed with failures
fn run(cli: &Cli) -> Result<bool> {
    let mut settings = DbSetupConfig::load_from(&cli.config).context("Failed to load settings")?;
    apply_overrides(cli, &mut settings);

    let types = settings.type_maps()?;
    let connection = settings.connection_config();
    log::debug!(
        "Settings from {}: database {}, sql log {:?}",
        cli.config.display(),
        connection.redacted_url(),
        settings.database.log
    );
    let engine = SchemaEngine::new(PostgresConnector, connection).with_type_maps(types);

    match &cli.command {
        Commands::Setup(args) => {
            let document = load_document(cli)?;
            let report = engine.setup(&document, &args.clone().into())?;
            print_setup(&report);
            Ok(true)
        }
        Commands::Clear { table } => {
            let document = load_document(cli)?;
            let report = engine.clear(&document, table.as_deref())?;
            println!("Cleared {} tables, {} failed", report.cleared, report.failed);
            Ok(report.is_success())
        }
        Commands::Uninstall => {
            let document = load_document(cli)?;
            let report = engine.uninstall(&document)?;
            println!(
                "Dropped {} views and {} tables",
                report.dropped_views, report.dropped_tables
            );
            for failure in &report.failures {
                eprintln!("  {} {}", "x".red(), failure);
            }
            Ok(report.is_success())
        }
        Commands::UninstallSetup(args) => {
            let document = load_document(cli)?;
            let report = engine.uninstall_setup(&document, &args.clone().into())?;
            for failure in &report.uninstall.failures {
                eprintln!("  {} {}", "x".red(), failure);
            }
            if let Some(setup) = &report.setup {
                print_setup(setup);
            }
            Ok(report.is_success())
        }
        Commands::Export { output } => {
            let report = engine.export(output)?;
            println!(
                "Exported {} tables ({} rows) to {}",
                report.tables,
                report.rows,
                report.path.display()
            );
            Ok(true)
        }
    }
}

fn apply_overrides(cli: &Cli, settings: &mut DbSetupConfig) {
    let db = &mut settings.database;
    if let Some(url) = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
    {
        db.url = url;
    }
    if cli.user.is_some() {
        db.user = cli.user.clone();
    }
    if cli.password.is_some() {
        db.password = cli.password.clone();
    }
    if let Some(level) = cli.log {
        db.log = level;
    }
    if cli.log_file.is_some() {
        db.log_file = cli.log_file.clone();
    }
    if cli.typemap.is_some() {
        settings.typemap = cli.typemap.clone();
    }
}

fn load_document(cli: &Cli) -> Result<SchemaDocument> {
    let Some(path) = &cli.file else {
        bail!("No schema document given. Use --file <PATH>.");
    };
    log::debug!("Loading schema document {}", path.display());
    SchemaDocument::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_setup(report: &SetupReport) {
    println!(
        "Created {} tables, {} indexes, {} views and {} rows",
        report.tables, report.indexes, report.views, report.rows
    );
}
