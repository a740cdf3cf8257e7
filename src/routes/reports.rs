use super::load_user;
use crate::aggregation::{
    compute_dashboard, compute_investment_categories, compute_leftover_after_bills,
    compute_monthly_financial_data, compute_totals,
};
use crate::alerts::compute_spending_alerts;
use crate::auth::Authenticator;
use crate::errors::ApiError;
use crate::schemas::User;
use crate::store::UserStore;
use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

async fn authorized_user(
    request: &HttpRequest,
    store: &dyn UserStore,
    authenticator: &Authenticator,
    user_id: &str,
) -> Result<User, ApiError> {
    authenticator.authorize_user(request, user_id)?;
    load_user(store, user_id).await
}

#[get("/user/{id}/totals")]
async fn get_totals(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_totals(&user)))
}

#[get("/user/{id}/monthly-financial")]
async fn get_monthly_financial(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_monthly_financial_data(&user, query.month.as_deref())))
}

#[get("/user/{id}/leftover")]
async fn get_leftover(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_leftover_after_bills(&user)))
}

#[get("/user/{id}/dashboard")]
async fn get_dashboard(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_dashboard(&user, query.month.as_deref())))
}

#[get("/user/{id}/alerts")]
async fn get_alerts(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_spending_alerts(&user)))
}

#[get("/user/{id}/investment-categories")]
async fn get_investment_categories(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = authorized_user(&request, store.get_ref(), &authenticator, &id).await?;
    Ok(HttpResponse::Ok().json(compute_investment_categories(&user)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_totals)
        .service(get_monthly_financial)
        .service(get_leftover)
        .service(get_dashboard)
        .service(get_alerts)
        .service(get_investment_categories);
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{bearer, sign_up, state, test_app};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    /// Salary 1000, one bill 500/300, one investment 200/200, spending 600.
    macro_rules! seed_records {
        ($app:expr, $id:expr, $token:expr) => {{
            let requests = [
                ("PATCH", format!("/user/{}", $id), json!({ "monthlySalary": 1000 })),
                ("POST", format!("/user/{}/bills", $id), json!({ "title": "Rent", "amountNeeded": 500, "amountDeposited": 300 })),
                ("POST", format!("/user/{}/investments", $id), json!({ "title": "Index fund", "amountNeeded": 200, "amountDeposited": 200 })),
                ("POST", format!("/user/{}/spendings", $id), json!({ "title": "Groceries", "amountDeposited": 600 })),
            ];
            for (method, uri, body) in requests {
                let request = match method {
                    "PATCH" => test::TestRequest::patch(),
                    _ => test::TestRequest::post(),
                }
                .uri(&uri)
                .insert_header(bearer(&$token))
                .set_json(body)
                .to_request();
                assert!(test::call_service(&$app, request).await.status().is_success());
            }
        }};
    }

    #[actix_web::test]
    async fn reports_reflect_stored_records() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        let (id, token) = sign_up!(app, "ada@example.com");
        seed_records!(app, id, token);

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/totals"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body,
            json!({
                "totalBillsNeeded": 500.0,
                "totalBillsDeposited": 300.0,
                "totalInvestmentNeeded": 200.0,
                "totalInvestmentDeposited": 200.0,
                "totalSpending": 600.0
            })
        );

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/leftover"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!(700.0));

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/dashboard?month=March%202025"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["month"], "March 2025");
        assert_eq!(body["leftover"], 700.0);
        assert_eq!(body["monthlyData"]["income"], 1000.0);
        assert_eq!(body["monthlyData"]["expenses"], 900.0);
        assert_eq!(
            body["monthlyData"]["byCategory"],
            json!({ "Bills": 300.0, "Investments": 200.0, "Spending": 600.0 })
        );

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/monthly-financial"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert!(!body["month"].as_str().unwrap().is_empty());
        assert_eq!(body["expenses"], 900.0);
    }

    #[actix_web::test]
    async fn alerts_and_investment_progress() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        let (id, token) = sign_up!(app, "ada@example.com");
        seed_records!(app, id, token);

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/alerts"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body,
            json!([
                {
                    "title": "Bills Shortage",
                    "message": "You're short by EUR 200.00 for bills this month",
                    "type": "shortage"
                },
                {
                    "title": "High Spending Alert",
                    "message": "Your spending (EUR 600.00) exceeds bills needed",
                    "type": "warning"
                }
            ])
        );

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/investment-categories"))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body[0]["name"], "Index fund");
        assert_eq!(body[0]["percentage"], 100.0);
        assert_eq!(body[0]["description"], "Investment in Index fund");
    }

    #[actix_web::test]
    async fn reports_for_missing_users_and_anonymous_callers() {
        let (store, auth) = state();
        let app = test_app!(store, auth);
        let (id, _) = sign_up!(app, "ada@example.com");

        let request = test::TestRequest::get()
            .uri(&format!("/user/{id}/dashboard"))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::get()
            .uri("/user/nobody/totals")
            .insert_header(bearer("service-token"))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "User 'nobody' not found");
    }
}
