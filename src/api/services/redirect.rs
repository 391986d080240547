//! 短链跳转

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{error, trace};

use crate::api::types::RedirectQuery;
use crate::errors::Result;
use crate::services::{ResolveOutcome, Resolver};
use crate::utils::is_valid_short_code;

/// 密码请求头
pub const PASSWORD_HEADER: &str = "X-Link-Password";

pub struct RedirectService;

impl RedirectService {
    /// GET：校验通过即记一次访问，一次性链接随之失效
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Arc<Resolver>>,
    ) -> HttpResponse {
        let code = path.into_inner();
        if !is_valid_short_code(&code) {
            // 非法短码，直接 404（不访问缓存与存储）
            trace!("Invalid short code rejected: {}", &code);
            return Self::not_found_response();
        }

        let password = Self::extract_password(&req);
        let result = resolver.resolve(&code, password.as_deref()).await;
        Self::respond(&code, result)
    }

    /// HEAD：同样的校验与响应，但不计数、不消费
    pub async fn handle_head(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Arc<Resolver>>,
    ) -> HttpResponse {
        let code = path.into_inner();
        if !is_valid_short_code(&code) {
            return Self::not_found_response();
        }

        let password = Self::extract_password(&req);
        let result = resolver.peek(&code, password.as_deref()).await;
        Self::respond(&code, result)
    }

    fn respond(code: &str, result: Result<ResolveOutcome>) -> HttpResponse {
        match result {
            Ok(ResolveOutcome::Redirect { target, .. }) => HttpResponse::TemporaryRedirect()
                .insert_header(("Location", target))
                .insert_header(("Cache-Control", "no-store"))
                .finish(),
            Ok(ResolveOutcome::Denied) => Self::password_challenge_response(),
            // 不存在、过期、已消费对外不可区分
            Ok(ResolveOutcome::NotFound | ResolveOutcome::Expired | ResolveOutcome::Consumed) => {
                Self::not_found_response()
            }
            Err(e) if e.is_retryable() => {
                error!("Store unavailable during redirect for '{}': {}", code, e);
                Self::unavailable_response()
            }
            Err(e) => {
                error!("Redirect failed for '{}': {}", code, e);
                Self::error_response()
            }
        }
    }

    /// `?password=` 优先，其次 `X-Link-Password` 头
    fn extract_password(req: &HttpRequest) -> Option<String> {
        web::Query::<RedirectQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().password)
            .filter(|p| !p.is_empty())
            .or_else(|| {
                req.headers()
                    .get(PASSWORD_HEADER)
                    .and_then(|h| h.to_str().ok())
                    .map(String::from)
                    .filter(|p| !p.is_empty())
            })
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .body("Not Found")
    }

    #[inline]
    fn password_challenge_response() -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .insert_header(("WWW-Authenticate", "Link-Password"))
            .body("Password Required")
    }

    #[inline]
    fn unavailable_response() -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Retry-After", "1"))
            .body("Service Unavailable")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::head().to(RedirectService::handle_head))
}
