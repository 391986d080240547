//! 公开签发与搜索接口 `/api/url`

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use tracing::info;

use crate::api::helpers::{api_result, error_from_snaplink, success_response};
use crate::api::types::{IssueResponse, LinkView, PostNewLink, SearchBody};
use crate::services::LinkService;

/// POST /api/url
pub async fn issue_link(
    body: web::Json<PostNewLink>,
    link_service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let req = body.into_inner();
    info!("API: issue link request for target: {}", req.url);

    match link_service.create_link(req.into()).await {
        Ok(issued) => success_response(IssueResponse::from(issued)),
        Err(e) => error_from_snaplink(&e),
    }
}

/// POST /api/url/search
pub async fn search_links(
    body: web::Json<SearchBody>,
    link_service: web::Data<Arc<LinkService>>,
) -> HttpResponse {
    let now = Utc::now();
    let result = link_service.search(body.into_inner().into()).await.map(|records| {
        records
            .into_iter()
            .map(|r| {
                let short_url = link_service.short_url(&r.code);
                LinkView::from_record(r, short_url, now)
            })
            .collect::<Vec<_>>()
    });
    api_result(result)
}

/// 公开 URL 路由 `/api/url`
pub fn url_routes() -> actix_web::Scope {
    web::scope("/api/url")
        .route("", web::post().to(issue_link))
        .route("/search", web::post().to(search_links))
}
