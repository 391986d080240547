use std::time::Duration;

use actix_web::dev::ServerHandle;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::AppServices;

/// 等待 Ctrl+C，然后在超时内停止服务器并完成关闭任务
pub async fn listen_for_shutdown(services: AppServices, server: ServerHandle, timeout_secs: u64) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, draining in-flight requests...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    let shutdown_result = timeout(
        Duration::from_secs(timeout_secs),
        perform_shutdown_tasks(&services, server),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                timeout_secs
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(services: &AppServices, server: ServerHandle) {
    server.stop(true).await;
    info!("HTTP server stopped");

    // 存储是唯一事实来源，缓存直接丢弃
    services.links.cache().invalidate_all().await;
}
