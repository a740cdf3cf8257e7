use super::load_user;
use crate::aggregation::effective_investment_categories;
use crate::auth::{AuthorizationLevel, Authenticator};
use crate::errors::ApiError;
use crate::schemas::{validate_investment_categories, InvestmentCategory, ProfilePatch};
use crate::store::UserStore;
use actix_web::{delete, get, patch, put, web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileJson {
    currency: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prof_pic: Option<String>,
}

#[get("/user")]
async fn list_users(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, ApiError> {
    if authenticator.authorize(&request)? != AuthorizationLevel::Service {
        return Err(ApiError::Forbidden);
    }
    Ok(HttpResponse::Ok().json(store.list_users().await?))
}

#[get("/user/{id}")]
async fn get_user(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    Ok(HttpResponse::Ok().json(load_user(store.get_ref(), &id).await?))
}

#[patch("/user/{id}")]
async fn update_user(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    json: web::Json<ProfilePatch>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    let patch = json.into_inner().normalized()?;
    match store.update_profile(&id, &patch).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::missing_user(&id)),
    }
}

#[delete("/user/{id}")]
async fn delete_user(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    match store.delete_user(&id).await? {
        Some(user) => {
            info!(user_id = %user.id, "User deleted");
            Ok(HttpResponse::Ok().json(user))
        }
        None => Err(ApiError::missing_user(&id)),
    }
}

#[get("/user/{id}/profile")]
async fn get_profile(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    let profile = load_user(store.get_ref(), &id).await?.profile;
    Ok(HttpResponse::Ok().json(ProfileJson {
        currency: profile.currency,
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        prof_pic: profile.prof_pic,
    }))
}

#[get("/user/{id}/allocations")]
async fn get_allocations(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    let user = load_user(store.get_ref(), &id).await?;
    Ok(HttpResponse::Ok().json(effective_investment_categories(&user)))
}

#[put("/user/{id}/allocations")]
async fn set_allocations(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    json: web::Json<Vec<InvestmentCategory>>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &id)?;
    validate_investment_categories(&json)?;
    match store.set_investment_categories(&id, &json).await? {
        Some(user) => Ok(HttpResponse::Ok().json(effective_investment_categories(&user))),
        None => Err(ApiError::missing_user(&id)),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user)
        .service(get_profile)
        .service(get_allocations)
        .service(set_allocations);
}
