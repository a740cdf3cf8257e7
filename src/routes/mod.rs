mod auth;
mod records;
mod reports;
mod users;

use crate::errors::ApiError;
use crate::schemas::User;
use crate::store::UserStore;
use actix_web::{get, web, HttpResponse};
use serde_json::json;

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "MoneyMap API" }))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Malformed JSON bodies answer with the same error shape as every other
/// rejection.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _request| ApiError::BadRequest(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health);
    auth::configure(cfg);
    users::configure(cfg);
    records::configure(cfg);
    reports::configure(cfg);
}

async fn load_user(store: &dyn UserStore, user_id: &str) -> Result<User, ApiError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::missing_user(user_id))
}
