#![cfg(not(tarpaulin_include))]

use catalog_lookup::config::LookupConfig;
use catalog_lookup::downloader::save_csv;
use catalog_lookup::engine::{CatalogLoader, LookupSession};
use catalog_lookup::record::{SortField, SortSpec};
use catalog_lookup::view::{LookupView, render_view};
use clap::Parser;
use std::io::{self, Write};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Search the product catalog from the terminal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Catalog feed URL or local CSV file
    #[arg(long)]
    source: Option<String>,

    /// Run a single search, print the results and exit
    #[arg(long)]
    query: Option<String>,

    /// Sort field for --query (code, description, price)
    #[arg(long, default_value = "code")]
    sort: String,

    /// Sort --query results in descending order
    #[arg(long)]
    desc: bool,
}

fn print_help() {
    println!("Commands:");
    println!("  <text>            Search item codes and descriptions");
    println!("  :sort <field>     Sort by code, description or price (again to reverse)");
    println!("  :clear            Clear the search");
    println!("  :retry            Retry a failed catalog load");
    println!("  :export <file>    Save the current results as CSV");
    println!("  :status           Show catalog status");
    println!("  help              Show this help");
    println!("  q                 Quit");
}

enum Flow {
    Quit,
    Render,
    Prompt,
}

/// Split a command line into its first word and the trimmed rest
fn split_command(command: &str) -> (&str, &str) {
    match command.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (command, ""),
    }
}

// Runs one REPL command. Searches never wait for the catalog fetch.
fn run_command(
    command: &str,
    loader: &CatalogLoader,
    session: &mut LookupSession,
    view: &mut LookupView,
    status: &mut String,
) -> Flow {
    let (word, arg) = split_command(command);

    match word {
        "q" if arg.is_empty() => Flow::Quit,
        "help" if arg.is_empty() => {
            print_help();
            Flow::Prompt
        }
        ":clear" => {
            *view = session.search(loader, "");
            Flow::Render
        }
        ":retry" => {
            if loader.is_loaded() {
                *status = String::from("already loaded");
                return Flow::Prompt;
            }
            loader.trigger();
            *view = session.view(loader);
            Flow::Render
        }
        ":status" => {
            let s = loader.status();
            println!("source:  {}", loader.source());
            println!("loaded:  {} ({} records)", s.loaded, s.records);
            println!("loading: {}", s.loading);
            if let Some(at) = s.loaded_at {
                println!("at:      {}", at.to_rfc3339());
            }
            if let Some(err) = s.error {
                println!("error:   {}", err);
            }
            Flow::Prompt
        }
        ":sort" => match SortField::from_name(arg) {
            Some(field) => {
                session.toggle_sort(field);
                *view = session.view(loader);
                Flow::Render
            }
            None => {
                *status = String::from("invalid sort field");
                Flow::Prompt
            }
        },
        ":export" => {
            if arg.is_empty() {
                *status = String::from("missing file name");
                return Flow::Prompt;
            }
            match save_csv(view.items(), arg) {
                Ok(()) => *status = format!("exported {} rows", view.items().len()),
                Err(e) => {
                    println!("Export failed: {}", e);
                    *status = String::from("export failed");
                }
            }
            Flow::Prompt
        }
        _ if command.starts_with(':') => {
            *status = String::from("invalid command");
            Flow::Prompt
        }
        _ => {
            *view = session.search(loader, command);
            Flow::Render
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = LookupConfig::from_overrides(args.source.as_deref(), None);
    let loader = CatalogLoader::new(config.source);

    if let Some(query) = args.query {
        let field = SortField::from_name(&args.sort)
            .ok_or_else(|| format!("Unknown sort field: {}", args.sort))?;
        let mut session = LookupSession::with_state("", SortSpec::new(field, !args.desc));
        session.search(&loader, &query);
        loader.settled().await;

        let view = session.view(&loader);
        print!("{}", render_view(&view));
        if let LookupView::Error { .. } = view {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut session = LookupSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut view = session.view(&loader);
    print!("{}", render_view(&view));

    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let waiting = loader.is_loading();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = loader.settled(), if waiting => {
                // the fetch finished while the prompt was up
                println!();
                view = session.view(&loader);
                print!("{}", render_view(&view));
                status = view.name().to_string();
                continue;
            }
        };

        let Some(command) = line else {
            break;
        };
        let command = command.trim();
        start_time = Instant::now();

        match run_command(command, &loader, &mut session, &mut view, &mut status) {
            Flow::Quit => break,
            Flow::Prompt => continue,
            Flow::Render => {
                print!("{}", render_view(&view));
                status = view.name().to_string();
            }
        }
    }

    Ok(())
}
