//! relmap command-line client
//!
//! Loads a SQLite database's schema and prints the inferred classes and
//! relationships.

mod formatter;

use clap::Parser;
use formatter::OutputFormat;
use relmap_core::{
    AccessorPolicy, LoaderConfig, LoaderOptions, MemoryRegistry, SchemaLoader, SqliteConnection,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// relmap command-line client
#[derive(Parser, Debug)]
#[command(name = "relmap")]
#[command(version, about = "Infer ORM classes and relationships from a database schema")]
pub struct Args {
    /// SQLite database file
    pub database: PathBuf,

    /// JSON loader configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Only load tables matching this pattern
    #[arg(long)]
    pub constraint: Option<String>,

    /// Skip tables matching this pattern
    #[arg(long)]
    pub exclude: Option<String>,

    /// Catalog schema to introspect
    #[arg(long)]
    pub schema: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Skip relationships that cannot be applied instead of failing
    #[arg(long)]
    pub best_effort: bool,

    /// Fail when two relationships share an accessor
    #[arg(long)]
    pub strict_accessors: bool,

    /// Do not infer relationships
    #[arg(long)]
    pub no_relationships: bool,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge the config file (if any) with command-line flags. Flags win.
    pub fn into_options(self) -> relmap_core::Result<LoaderOptions> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::default(),
        };

        if self.constraint.is_some() {
            config.constraint = self.constraint;
        }
        if self.exclude.is_some() {
            config.exclude = self.exclude;
        }
        if self.schema.is_some() {
            config.db_schema = self.schema;
        }
        if self.best_effort {
            config.best_effort = true;
        }
        if self.strict_accessors {
            config.accessor_policy = AccessorPolicy::Strict;
        }
        if self.no_relationships {
            config.relationships = Some(false);
        }
        if self.debug {
            config.debug = true;
        }

        config.into_options()
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.debug { "relmap=debug" } else { "relmap=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let database = args.database.clone();
    let format = args.format;
    let options = args.into_options()?;

    let conn = SqliteConnection::open(&database)?;
    let mut loader = SchemaLoader::new(conn, options);
    let mut registry = MemoryRegistry::new();
    let report = loader.load(&mut registry)?;

    info!(
        database = %database.display(),
        classes = registry.len(),
        "loaded"
    );

    let formatter = formatter::create_formatter(format);
    println!("{}", formatter.format_load(&report, &registry));
    Ok(())
}
