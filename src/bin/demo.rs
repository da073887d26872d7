//! Demo run: create the table, exercise every item operation, drop the table.
//!
//! Usage: `dynostore-demo [config.json]`. Without a file the defaults are
//! used; `DYNOSTORE_*` environment variables override either.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use dynostore::blocking::{BlockingItemStore, BlockingTableController, new_runtime};
use dynostore::client::build_client;
use dynostore::{DynamoDbDatastore, Item, Result, StoreConfig, TableController};

fn load_config() -> Result<StoreConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::from_json_file(path)?,
        None => StoreConfig::default(),
    };
    config.apply_env()
}

/// Look up a key that was never written. Returns the item if one is there.
fn find_unexpected(store: &BlockingItemStore, primary_key: &str) -> Result<Option<Item>> {
    match store.get(primary_key) {
        Ok(found) => Ok(Some(found)),
        Err(e) if e.is_not_found() => {
            info!(error = %e, "non-existent item is reported as not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn run() -> Result<ExitCode> {
    let config = load_config()?;
    info!(?config, "loaded configuration");

    let runtime = new_runtime()?;
    let client = runtime.block_on(build_client(&config.aws));
    let controller = BlockingTableController::new(
        TableController::new(
            Arc::new(DynamoDbDatastore::new(client)),
            config.table.clone(),
            config.wait,
        ),
        runtime,
    );

    let store = controller.ready_store()?;

    let item = Item::new("some-unique-id").with_attr("color", "red");
    store.put(&item)?;
    info!(%item, "item saved");

    let saved = store.get(item.primary_key())?;
    info!(item = %saved, "got item");

    if let Some(found) = find_unexpected(&store, "unknown")? {
        error!(item = %found, "got an item for a key that was never written");
        return Ok(ExitCode::FAILURE);
    }

    let updated = Item::new("some-unique-id").with_attr("color", "violet");
    store.update(&updated)?;
    let reread = store.get(updated.primary_key())?;
    info!(item = %reread, "item updated");

    store.delete(&item)?;
    controller.destroy()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    if let Err(e) = dynostore::telemetry::init_tracing("info") {
        eprintln!("{}", e);
    }

    match run() {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}
