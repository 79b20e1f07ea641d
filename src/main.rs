//! fastlabel server entry point

use std::sync::Arc;

use fastlabel::server::{AppState, start_server};
use fastlabel::store::migrate_object_ids;
use fastlabel::{LabelStore, ServerConfig, SessionHandler, StoreOptions};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("fastlabel error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let image_paths = config.scan_images()?;
    log::info!(
        "Found {} images in {:?}",
        image_paths.len(),
        config.images_dir
    );

    let mut options = StoreOptions::new(config.id_prefix.clone()).readonly(config.readonly);
    if let Some(labels_dir) = &config.labels_dir {
        options = options.labels_dir(labels_dir);
    }
    let store = Arc::new(LabelStore::for_files(image_paths, options)?);

    if config.update_label_object_ids {
        let report = migrate_object_ids(&store)?;
        for path in &report.skipped {
            log::warn!("Label file not migrated: {:?}", path);
        }
    }

    let state = AppState::new(
        SessionHandler::new(store),
        config.interface_settings.clone(),
    );
    start_server(state, &config.host, config.port).await?;
    Ok(())
}
