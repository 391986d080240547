use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, trace};

use crate::api::error_code::ErrorCode;
use crate::api::helpers::json_response;
use crate::api::types::{HealthResponse, HealthStoreCheck};
use crate::services::LinkService;
use crate::utils::TimeParser;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// Health Service
///
/// 直接探测存储（`health_check` + `count`），不经过缓存。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        link_service: web::Data<Arc<LinkService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let store = link_service.store();
        // 存储调用本身带超时（DeadlineStore），这里不再包一层
        let probe = match store.health_check().await {
            Ok(()) => store.count().await,
            Err(e) => Err(e),
        };
        let store_status = match probe {
            Ok(count) => {
                trace!("Store health check passed, {} links found", count);
                HealthStoreCheck {
                    status: "healthy".to_string(),
                    backend: store.backend_name().to_string(),
                    links_count: Some(count),
                    error: None,
                }
            }
            Err(e) => {
                error!("Store health check failed: {}", e);
                HealthStoreCheck {
                    status: "unhealthy".to_string(),
                    backend: store.backend_name().to_string(),
                    links_count: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let now = chrono::Utc::now();
        let is_healthy = store_status.status == "healthy";

        let health_data = HealthResponse {
            status: store_status.status.clone(),
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            uptime_human: TimeParser::format_duration_human(app_start_time.start_datetime, now),
            store: store_status,
            cache_entries: link_service.cache().entry_count(),
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        if is_healthy {
            json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(health_data))
        } else {
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                "Store unavailable",
                Some(health_data),
            )
        }
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
}
