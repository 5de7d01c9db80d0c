use anyhow::Result;
use prospect_crm::config::AppConfig;
use prospect_crm::store::PostgresStore;

/// Lists tables left behind by earlier schema versions; `--drop` removes them.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let drop = std::env::args().skip(1).any(|arg| arg == "--drop");

    let config = AppConfig::load()?;
    let names = config.schema_names()?;
    let database_url = config.database_url()?;
    let store = PostgresStore::new(&database_url, 1, names).await?;

    println!(
        "Connected to database. Current schema version is {}",
        store.names().version()
    );

    let abandoned = store.abandoned_tables().await?;
    if abandoned.is_empty() {
        println!("No abandoned tables found");
        return Ok(());
    }

    println!("Found {} abandoned tables:", abandoned.len());
    for (table, version) in &abandoned {
        println!("  {} (version {})", table, version);
    }

    if !drop {
        println!("\nRun again with --drop to remove them");
        return Ok(());
    }

    for (table, _) in &abandoned {
        store.drop_abandoned_table(table).await?;
        println!("Dropped {}", table);
    }
    println!("\nSchema cleanup completed!");

    Ok(())
}
