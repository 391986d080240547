//! 过期记录清理任务
//!
//! 删除过期超过宽限期的记录以及已消费的一次性记录。
//! 手动禁用的链接保留。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::Result;
use crate::storage::LinkStore;

pub struct Sweeper {
    store: Arc<dyn LinkStore>,
    grace: Duration,
}

impl Sweeper {
    pub fn new(store: Arc<dyn LinkStore>, grace: Duration) -> Self {
        Self { store, grace }
    }

    /// 执行一次清理，返回删除数量
    pub async fn run_once(&self) -> Result<u64> {
        let removed = self.store.sweep(Utc::now(), self.grace).await?;
        info!(
            target: "snaplink::events",
            event = "sweep",
            removed,
            grace_secs = self.grace.num_seconds()
        );
        Ok(removed)
    }

    pub fn spawn_background_task(self: Arc<Self>, interval_secs: u64) -> JoinHandle<()> {
        let handle = tokio::spawn(async move {
            let interval = StdDuration::from_secs(interval_secs);
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = self.run_once().await {
                    error!("Link sweep failed: {}", e);
                }
            }
        });

        info!(
            "Link sweep background task started (interval: {}s)",
            interval_secs
        );
        handle
    }
}
