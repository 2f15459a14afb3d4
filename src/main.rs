// Main entry point for the queex CLI
// Builds a query from command-line arguments and runs it against MongoDB or MySQL

use anyhow::Result;
use bson::Bson;
use clap::{Parser as ClapParser, Subcommand};
use queex::{
    compile_filter, Config, ConditionGroup, DocumentResults, FieldCondition, Logical,
    QueryExecutor, Selection, SqlQuery,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// queex - query MongoDB or MySQL with simple field conditions
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search every configured MongoDB collection
    Mongo {
        /// Condition as field=value:mode, mode being exact or partial
        #[arg(short, long = "field", required = true)]
        fields: Vec<FieldCondition>,

        /// How the conditions are combined: or, and
        #[arg(short, long, default_value = "or")]
        logical: Logical,

        /// Print the compiled filter without connecting
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a SELECT against MySQL
    Sql {
        /// Columns to fetch: * or a comma-separated list
        #[arg(short, long, default_value = "*")]
        select: Selection,

        /// Table to query
        #[arg(short, long)]
        table: String,

        /// Condition group as JSON, e.g.
        /// {"logical":"and","conditions":[["logical","or"],["nama",["riki","contain"]]]}
        #[arg(short, long = "group")]
        groups: Vec<ConditionGroup>,

        /// Print the assembled statement without connecting
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Mongo {
            fields,
            logical,
            dry_run,
        } => {
            if dry_run {
                let filter = Bson::Document(compile_filter(&fields, logical)?);
                println!("{}", serde_json::to_string_pretty(&filter.into_relaxed_extjson())?);
                return Ok(());
            }

            let mut executor = QueryExecutor::new(config);
            let results = executor.mongo_query(&fields, logical)?;
            print_documents(&results)?;
        }
        Command::Sql {
            select,
            table,
            groups,
            dry_run,
        } => {
            if dry_run {
                println!("{}", SqlQuery::build(&select, &table, &groups)?);
                return Ok(());
            }

            let mut executor = QueryExecutor::new(config);
            let rows = executor.sql_query(&select, &table, &groups)?;
            println!("{}", rows.format());
        }
    }

    Ok(())
}

/// Send logs to stderr so results on stdout stay clean
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print each collection's matches as relaxed extended JSON
fn print_documents(results: &DocumentResults) -> Result<()> {
    for (collection, documents) in results.iter() {
        println!("== {} ({} document(s))", collection, documents.len());
        for document in documents {
            let json = Bson::Document(document.clone()).into_relaxed_extjson();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    println!("\n{} document(s) returned", results.total());
    Ok(())
}
