// src/web/handlers/system_handlers.rs
use crate::auth::OptionalAuth;

use rocket::serde::json::Json;
use tracing::info;

pub async fn health_handler(auth: OptionalAuth) -> Json<&'static str> {
    if let Some(tenant) = auth.tenant {
        info!(
            "Health check by {} (tenant: {})",
            tenant.subject, tenant.tenant_id
        );
    } else {
        info!("Health check by anonymous caller");
    }
    Json("OK")
}
