//! Admin API `/admin/v1`
//!
//! 所有路由都在 `AdminAuth` 之后。

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::info;

use crate::api::helpers::{api_result, error_from_snaplink, success_response};
use crate::api::types::{ExtendBody, LinkView, OwnerQuery, SweepResponse};
use crate::errors::SnaplinkError;
use crate::services::{LinkService, Sweeper};
use crate::storage::LinkRecord;

fn view(link_service: &LinkService, record: LinkRecord) -> LinkView {
    let short_url = link_service.short_url(&record.code);
    LinkView::from_record(record, short_url, Utc::now())
}

/// GET /links?owner=
pub async fn list_links(
    query: web::Query<OwnerQuery>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let Some(owner) = query.into_inner().owner.filter(|o| !o.trim().is_empty()) else {
        return error_from_snaplink(&SnaplinkError::validation(
            "Query parameter 'owner' is required",
        ));
    };
    let result = link_service.list_by_owner(owner.trim()).await.map(|records| {
        records
            .into_iter()
            .map(|r| view(&link_service, r))
            .collect::<Vec<_>>()
    });
    api_result(result)
}

/// GET /links/{code}
pub async fn get_link(
    path: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let code = path.into_inner();
    api_result(
        link_service
            .get_link(&code)
            .await
            .map(|r| view(&link_service, r)),
    )
}

/// DELETE /links/{code}
pub async fn delete_link(
    path: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let code = path.into_inner();
    info!("Admin API: delete link request - code: {}", code);
    match link_service.delete_link(&code).await {
        Ok(()) => success_response(serde_json::json!({ "code": code })),
        Err(e) => error_from_snaplink(&e),
    }
}

/// POST /links/{code}/disable
pub async fn disable_link(
    path: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    set_active(path.into_inner(), false, &link_service).await
}

/// POST /links/{code}/enable
pub async fn enable_link(
    path: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    set_active(path.into_inner(), true, &link_service).await
}

async fn set_active(code: String, active: bool, link_service: &LinkService) -> HttpResponse {
    info!(
        "Admin API: {} link request - code: {}",
        if active { "enable" } else { "disable" },
        code
    );
    api_result(
        link_service
            .set_active(&code, active)
            .await
            .map(|r| view(link_service, r)),
    )
}

/// POST /links/{code}/extend
pub async fn extend_link(
    path: web::Path<String>,
    body: web::Json<ExtendBody>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let code = path.into_inner();
    info!("Admin API: extend link request - code: {}", code);
    api_result(
        link_service
            .extend_expiry(&code, body.into_inner().into())
            .await
            .map(|r| view(&link_service, r)),
    )
}

/// POST /sweep
pub async fn run_sweep(sweeper: web::Data<Arc<Sweeper>>) -> HttpResponse {
    info!("Admin API: manual sweep requested");
    api_result(sweeper.run_once().await.map(|removed| SweepResponse { removed }))
}

/// 链接管理路由 `/links`
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(list_links))
        .route("/{code}", web::get().to(get_link))
        .route("/{code}", web::delete().to(delete_link))
        .route("/{code}/disable", web::post().to(disable_link))
        .route("/{code}/enable", web::post().to(enable_link))
        .route("/{code}/extend", web::post().to(extend_link))
}

pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(links_routes())
        .route("/sweep", web::post().to(run_sweep))
}
