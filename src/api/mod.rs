//! HTTP API
//!
//! Route order matters: the catch-all `/{code}` redirect is registered last.

pub mod error_code;
pub mod helpers;
pub mod middleware;
pub mod services;
pub mod types;

use actix_web::web;

use crate::services::AppServices;
use middleware::AdminAuth;
use services::{
    AppStartTime, admin_v1_routes, bulk_routes, health_routes, redirect_routes, url_routes,
};

/// Request body limit for `/bulk` and the JSON endpoints
pub const PAYLOAD_LIMIT: usize = 4 * 1024 * 1024;

/// Register shared state and every route on an actix `App`.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    services: &AppServices,
    start_time: AppStartTime,
    admin_token: &str,
) {
    cfg.app_data(web::Data::new(services.links.clone()))
        .app_data(web::Data::new(services.resolver.clone()))
        .app_data(web::Data::new(services.bulk.clone()))
        .app_data(web::Data::new(services.sweeper.clone()))
        .app_data(web::Data::new(start_time))
        .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
        .app_data(web::JsonConfig::default().limit(PAYLOAD_LIMIT))
        .service(
            web::scope("/admin")
                .wrap(AdminAuth::new(admin_token))
                .service(admin_v1_routes()),
        )
        .service(health_routes())
        .service(url_routes())
        .service(bulk_routes())
        .service(redirect_routes());
}
