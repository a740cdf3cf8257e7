use crate::auth::Authenticator;
use crate::errors::ApiError;
use crate::schemas::{
    normalize_currency, normalize_email, validate_password, Profile, User, UserSummary,
    DEFAULT_CURRENCY,
};
use crate::store::{UserDocument, UserStore};
use actix_web::{get, patch, post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupJson {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
    password: String,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Deserialize)]
struct LoginJson {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutJson {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordJson {
    email: String,
    current_password: String,
    new_password: String,
}

#[derive(Serialize)]
struct SessionJson {
    message: &'static str,
    token: String,
    user: UserSummary,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

#[post("/auth/signup")]
async fn signup(
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    json: web::Json<SignupJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    let email = normalize_email(&json.email)?;
    validate_password(&json.password)?;
    let currency = match json.currency.as_deref() {
        Some(currency) if !currency.trim().is_empty() => normalize_currency(currency)?,
        _ => DEFAULT_CURRENCY.to_string(),
    };

    if store.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let user = User::new(
        Uuid::new_v4().to_string(),
        Profile {
            first_name: json.first_name.trim().to_string(),
            last_name: json.last_name.trim().to_string(),
            email,
            currency,
            monthly_salary: 0.0,
            prof_pic: None,
        },
    );
    let password_hash = authenticator.hash_password(&json.password)?;
    store
        .insert_user(UserDocument::new(user.clone(), password_hash))
        .await?;
    info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(SessionJson {
        message: "User registered successfully",
        token: authenticator.issue_token(&user.id)?,
        user: user.summary(),
    }))
}

#[post("/auth/login")]
async fn login(
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    json: web::Json<LoginJson>,
) -> Result<HttpResponse, ApiError> {
    let email = json.email.trim().to_lowercase();
    let Some(document) = store.find_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };
    if !authenticator.verify_password(&json.password, &document.password_hash)? {
        warn!(user_id = %document.user.id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    Ok(HttpResponse::Ok().json(SessionJson {
        message: "Login successful",
        token: authenticator.issue_token(&document.user.id)?,
        user: document.user.summary(),
    }))
}

// Tokens are stateless; logging out only confirms the caller and the user.
#[post("/auth/logout")]
async fn logout(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    json: web::Json<LogoutJson>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(&request, &json.user_id)?;
    if store.find_user(&json.user_id).await?.is_none() {
        return Err(ApiError::missing_user(&json.user_id));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Logout successful" })))
}

#[patch("/auth/forgot-password")]
async fn change_password(
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    json: web::Json<ChangePasswordJson>,
) -> Result<HttpResponse, ApiError> {
    let email = json.email.trim().to_lowercase();
    let document = store
        .find_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;
    if !authenticator.verify_password(&json.current_password, &document.password_hash)? {
        warn!(user_id = %document.user.id, "Password change with wrong current password");
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    validate_password(&json.new_password)?;

    let password_hash = authenticator.hash_password(&json.new_password)?;
    if !store
        .set_password_hash(&document.user.id, &password_hash)
        .await?
    {
        return Err(ApiError::missing_user(&document.user.id));
    }
    info!(user_id = %document.user.id, "Password updated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}

#[get("/auth/profile/{email}")]
async fn profile_by_email(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    email: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let level = authenticator.authorize(&request)?;
    let email = email.into_inner().trim().to_lowercase();
    let document = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    level.ensure_access(&document.user.id)?;
    Ok(HttpResponse::Ok().json(document.user))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(login)
        .service(logout)
        .service(change_password)
        .service(profile_by_email);
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{bearer, sign_up, state, test_app};
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    #[actix_web::test]
    async fn signup_returns_token_and_summary() {
        let (store, auth) = state();
        let app = test_app!(store, auth);

        let request = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "Ada@Example.com",
                "password": "analytical-engine"
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["currency"], "USD");
        assert_eq!(body["user"]["monthlySalary"], 0.0);
        assert!(body["user"].get("passwordHash").is_none());
        let user_id = body["user"]["id"].as_str().unwrap();
        assert_eq!(
            auth.verify_token(body["token"].as_str().unwrap()).as_deref(),
            Some(user_id)
        );
    }

    #[actix_web::test]
    async fn signup_rejects_duplicates_and_short_passwords() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        sign_up!(app, "ada@example.com");

        let request = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({ "email": "ADA@example.com", "password": "another-password" }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::CONFLICT);

        let request = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({ "email": "new@example.com", "password": "short" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Password must be at least 8 characters");

        let request = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({ "email": "x@example.com", "password": "long-enough", "currency": "dollars" }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn login_checks_password() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        let (user_id, _) = sign_up!(app, "ada@example.com");

        let request = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "analytical-engine" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["user"]["id"], user_id.as_str());
        assert_eq!(body["user"]["currency"], "EUR");

        let request = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "difference-engine" }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "nobody@example.com", "password": "analytical-engine" }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn password_change_then_login_with_new_password() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        sign_up!(app, "ada@example.com");

        let request = test::TestRequest::patch()
            .uri("/auth/forgot-password")
            .set_json(json!({
                "email": "ada@example.com",
                "currentPassword": "wrong-password",
                "newPassword": "difference-engine"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::patch()
            .uri("/auth/forgot-password")
            .set_json(json!({
                "email": "ada@example.com",
                "currentPassword": "analytical-engine",
                "newPassword": "difference-engine"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let request = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "difference-engine" }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn logout_and_profile_need_matching_token() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        let (ada, ada_token) = sign_up!(app, "ada@example.com");
        let (_, grace_token) = sign_up!(app, "grace@example.com");

        let request = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(bearer(&ada_token))
            .set_json(json!({ "userId": ada }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let request = test::TestRequest::get()
            .uri("/auth/profile/ada@example.com")
            .insert_header(bearer(&grace_token))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::get()
            .uri("/auth/profile/ada@example.com")
            .insert_header(bearer(&ada_token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["id"], ada.as_str());
        assert_eq!(body["profile"]["email"], "ada@example.com");
    }
}
