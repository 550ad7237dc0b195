use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use newsdex::index::{build_index, IndexerConfig};
use newsdex::Error;

/// Build a newsdex store from a gzip-compressed archive.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the gzip-compressed archive.
    archive: PathBuf,
    /// Directory to write the store into; must not already exist.
    output_dir: PathBuf,
    /// Skip stemming and index raw tokens.
    #[arg(long)]
    no_stem: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.archive.is_file() {
        return Err(Error::BadArgs(format!("archive path {} is not a file", cli.archive.display())).into());
    }

    let config = if cli.no_stem {
        IndexerConfig {
            stemmer: Box::new(newsdex::tokenize::IdentityStemmer),
        }
    } else {
        IndexerConfig::default()
    };

    let manifest = build_index(&cli.archive, &cli.output_dir, &config)
        .with_context(|| format!("indexing {} into {}", cli.archive.display(), cli.output_dir.display()))?;

    println!(
        "indexed {} documents, {} terms, stemmer={}",
        manifest.num_documents, manifest.num_terms, manifest.stemmer
    );
    Ok(())
}
