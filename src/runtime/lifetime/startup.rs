use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::AppServices;
use crate::storage::{LinkStore, StorageFactory};

pub struct StartupContext {
    pub store: Arc<dyn LinkStore>,
    pub services: AppServices,
}

/// 打开存储并装配全部服务（Server 与 CLI 共用）
pub async fn prepare_services(config: &StaticConfig) -> Result<StartupContext> {
    let store = StorageFactory::create(config)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", store.backend_name());

    let services =
        AppServices::build(store.clone(), config).context("Failed to initialize services")?;

    Ok(StartupContext { store, services })
}

/// 准备服务器启动的上下文，并启动后台清理任务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let context = prepare_services(config).await?;

    match context.store.count().await {
        Ok(count) => info!("Store holds {} links", count),
        Err(e) => tracing::warn!("Failed to count links at startup (non-fatal): {}", e),
    }

    if config.links.sweep_interval_secs > 0 {
        context
            .services
            .sweeper
            .clone()
            .spawn_background_task(config.links.sweep_interval_secs);
    } else {
        info!("Link sweep disabled (links.sweep_interval_secs = 0)");
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
