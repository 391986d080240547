pub mod admin;
pub mod bulk;
pub mod health;
pub mod redirect;
pub mod url;

pub use admin::admin_v1_routes;
pub use bulk::bulk_routes;
pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use url::url_routes;
