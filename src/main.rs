//! `saved-searches` command line front end

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use saved_searches::config::{default_config_path, load_config};
use saved_searches::{logging, NotmuchCli, OpenQuery, SavedSearches, SearchListError};

/// Give up on background counts after this long
const SETTLE_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "saved-searches")]
#[command(about = "Saved notmuch searches with message counts")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/saved-searches/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Saved-search file, overriding `searchesFile` from the config
    #[arg(long, global = true, value_name = "PATH")]
    searches_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every row with its counts
    List,
    /// Append a query to the saved searches
    Save {
        /// notmuch query, e.g. "tag:todo and date:1w.."
        query: String,
    },
    /// Print the query at a row, as a results view would receive it
    Open {
        /// Row number as printed by `list`
        position: usize,
    },
}

/// Opener that hands the query to the terminal
struct PrintOpener;

impl OpenQuery for PrintOpener {
    fn open_query(&mut self, name: &str, query: &str) {
        if name.is_empty() {
            println!("{}", query);
        } else {
            println!("{}\t{}", name, query);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let config_path = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(SearchListError::Config(format!(
                "{} does not exist",
                path.display()
            ))
            .into());
        }
        Some(path) => path.clone(),
        None => default_config_path(),
    };
    let mut config = load_config(&config_path);
    if let Some(path) = &cli.searches_file {
        config.searches_file = Some(path.to_string_lossy().into_owned());
    }

    let backend = NotmuchCli::new(config.counts.get_notmuch_path(), config.counts.get_timeout())
        .with_config(config.counts.get_database());
    let mut list = SavedSearches::from_config(&config, Arc::new(backend));

    match cli.command {
        Command::List => {
            list.settle_counts(std::time::Duration::from_secs(SETTLE_TIMEOUT_SECS));
            print_list(&list);
        }
        Command::Save { query } => {
            list.save_query(&query)
                .with_context(|| format!("Failed to save query '{}'", query))?;
            list.process_pending_reload();
            info!(query = %query, rows = list.store().len(), "Query saved");
            print_list(&list);
        }
        Command::Open { position } => {
            list.activate_at(position, &mut PrintOpener)
                .with_context(|| format!("Cannot open row {}", position))?;
        }
    }

    Ok(())
}

fn print_list(list: &SavedSearches) {
    let selected = list.selected();
    for (position, entry) in list.store().iter().enumerate() {
        let marker = if selected == Some(position) { '>' } else { ' ' };
        match entry.query_str() {
            None => println!("{} {:>3}  [{}]", marker, position, entry.name()),
            Some(query) => println!(
                "{} {:>3}  {:<16} {:<32} {} {}",
                marker,
                position,
                entry.name(),
                query,
                entry.total_label(),
                entry.unread_label()
            ),
        }
    }
}
