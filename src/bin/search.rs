use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use newsdex::retrieve::{default_top_k, Retriever};
use newsdex::Error;

/// Interactively query a newsdex store.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a store directory built by `newsdex-index`.
    store_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.store_dir.is_dir() {
        return Err(Error::BadArgs(format!("store directory {} does not exist", cli.store_dir.display())).into());
    }

    let retriever =
        Retriever::open(&cli.store_dir).with_context(|| format!("opening store {}", cli.store_dir.display()))?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut last_hits: Vec<newsdex::Hit> = Vec::new();

    loop {
        print!("query> ");
        stdout.flush()?;
        let mut query = String::new();
        if stdin.lock().read_line(&mut query)? == 0 {
            break;
        }
        let query = query.trim();
        if query.is_empty() || query == "q" {
            break;
        }

        match retriever.search(query, default_top_k()) {
            Ok(hits) => {
                for hit in hits.iter().take(10) {
                    println!(
                        "{}. {} ({}) {:.4} - {}",
                        hit.rank,
                        hit.docno,
                        hit.date.as_deref().unwrap_or(""),
                        hit.score,
                        hit.headline.as_deref().unwrap_or("")
                    );
                    if let Some(snippet) = &hit.snippet {
                        println!("   {}", snippet);
                    }
                }
                last_hits = hits;
            }
            Err(Error::EmptyResult) => println!("no results"),
            Err(e) => println!("error: {}", e),
        }

        loop {
            print!("rank/n/q> ");
            stdout.flush()?;
            let mut cmd = String::new();
            if stdin.lock().read_line(&mut cmd)? == 0 {
                return Ok(());
            }
            let cmd = cmd.trim();
            if cmd == "n" || cmd.is_empty() {
                break;
            }
            if cmd == "q" {
                return Ok(());
            }
            if let Ok(rank) = cmd.parse::<usize>() {
                if let Some(hit) = last_hits.iter().find(|h| h.rank == rank) {
                    match retriever.document_by_docno(&hit.docno) {
                        Ok(text) => println!("{}", text),
                        Err(e) => println!("error: {}", e),
                    }
                } else {
                    println!("no such rank");
                }
            } else {
                println!("enter a rank, 'n' for next query, or 'q' to quit");
            }
        }
    }

    Ok(())
}
