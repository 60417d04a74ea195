use std::{error::Error, fs::File, path::PathBuf};

use clap::Parser;
use foodgram_sdk::{
    config::Config,
    connection::{establish_connection, run_migrations},
    import::{import_ingredients, import_tags, read_ingredients, read_tags},
};
use log::info;

/// Loads ingredient and tag reference data from header-less CSV files.
#[derive(Parser)]
struct Args {
    /// Rows of `name,measurement_unit`
    #[arg(long)]
    ingredients: Option<PathBuf>,

    /// Rows of `name,color,slug`
    #[arg(long)]
    tags: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.ingredients.is_none() && args.tags.is_none() {
        return Err("Nothing to import, pass --ingredients and/or --tags".into());
    }

    let config = Config::load()?;
    let pool = establish_connection(&config).await?;
    run_migrations(&pool).await?;

    if let Some(path) = args.ingredients {
        info!("Reading ingredients from {}", path.display());
        let records = read_ingredients(File::open(&path)?)?;
        let inserted = import_ingredients(&records, &pool).await?;
        println!(
            "Ingredients: {inserted} added, {} already present",
            (records.len() as u64).saturating_sub(inserted)
        );
    }

    if let Some(path) = args.tags {
        info!("Reading tags from {}", path.display());
        let records = read_tags(File::open(&path)?)?;
        let inserted = import_tags(&records, &pool).await?;
        println!(
            "Tags: {inserted} added, {} already present",
            (records.len() as u64).saturating_sub(inserted)
        );
    }

    pool.close().await;

    Ok(())
}
