use crate::auth::Authenticator;
use crate::errors::{ApiError, ValidationError};
use crate::schemas::{
    BillPatch, InvestmentPatch, NewBill, NewInvestment, NewSpending, Record, RecordKind,
    RecordPatch, SpendingPatch, User,
};
use crate::store::UserStore;
use actix_web::{delete, patch, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

// A store miss means either the user or the record is absent; tell which.
async fn found(
    store: &dyn UserStore,
    updated: Option<User>,
    user_id: &str,
    kind: RecordKind,
    record_id: &str,
) -> Result<HttpResponse, ApiError> {
    match updated {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None if store.find_user(user_id).await?.is_none() => Err(ApiError::missing_user(user_id)),
        None => Err(ApiError::NotFound(format!(
            "{} '{record_id}' not found",
            kind.singular()
        ))),
    }
}

async fn add_record(
    request: &HttpRequest,
    store: &dyn UserStore,
    authenticator: &Authenticator,
    user_id: &str,
    build: impl FnOnce(String) -> Result<Record, ValidationError>,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(request, user_id)?;
    let record = build(new_record_id())?;
    match store.push_record(user_id, record).await? {
        Some(user) => Ok(HttpResponse::Created().json(user)),
        None => Err(ApiError::missing_user(user_id)),
    }
}

async fn update_record(
    request: &HttpRequest,
    store: &dyn UserStore,
    authenticator: &Authenticator,
    (user_id, record_id): (String, String),
    patch: RecordPatch,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(request, &user_id)?;
    let patch = patch.normalized()?;
    let updated = store.update_record(&user_id, &record_id, &patch).await?;
    found(store, updated, &user_id, patch.kind(), &record_id).await
}

async fn remove_record(
    request: &HttpRequest,
    store: &dyn UserStore,
    authenticator: &Authenticator,
    (user_id, record_id): (String, String),
    kind: RecordKind,
) -> Result<HttpResponse, ApiError> {
    authenticator.authorize_user(request, &user_id)?;
    let updated = store.remove_record(&user_id, kind, &record_id).await?;
    found(store, updated, &user_id, kind, &record_id).await
}

#[post("/user/{id}/bills")]
async fn add_bill(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    json: web::Json<NewBill>,
) -> Result<HttpResponse, ApiError> {
    add_record(&request, store.get_ref(), &authenticator, &id, |record_id| {
        json.into_inner().into_bill(record_id).map(Record::Bill)
    })
    .await
}

#[patch("/user/{id}/bills/{bill_id}")]
async fn update_bill(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
    json: web::Json<BillPatch>,
) -> Result<HttpResponse, ApiError> {
    let patch = RecordPatch::Bill(json.into_inner());
    update_record(&request, store.get_ref(), &authenticator, path.into_inner(), patch).await
}

#[delete("/user/{id}/bills/{bill_id}")]
async fn delete_bill(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    remove_record(&request, store.get_ref(), &authenticator, path.into_inner(), RecordKind::Bills).await
}

#[post("/user/{id}/investments")]
async fn add_investment(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    json: web::Json<NewInvestment>,
) -> Result<HttpResponse, ApiError> {
    add_record(&request, store.get_ref(), &authenticator, &id, |record_id| {
        json.into_inner().into_investment(record_id).map(Record::Investment)
    })
    .await
}

#[patch("/user/{id}/investments/{investment_id}")]
async fn update_investment(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
    json: web::Json<InvestmentPatch>,
) -> Result<HttpResponse, ApiError> {
    let patch = RecordPatch::Investment(json.into_inner());
    update_record(&request, store.get_ref(), &authenticator, path.into_inner(), patch).await
}

#[delete("/user/{id}/investments/{investment_id}")]
async fn delete_investment(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    remove_record(
        &request,
        store.get_ref(),
        &authenticator,
        path.into_inner(),
        RecordKind::Investments,
    )
    .await
}

#[post("/user/{id}/spendings")]
async fn add_spending(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    id: web::Path<String>,
    json: web::Json<NewSpending>,
) -> Result<HttpResponse, ApiError> {
    add_record(&request, store.get_ref(), &authenticator, &id, |record_id| {
        json.into_inner().into_spending(record_id).map(Record::Spending)
    })
    .await
}

#[patch("/user/{id}/spendings/{spending_id}")]
async fn update_spending(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
    json: web::Json<SpendingPatch>,
) -> Result<HttpResponse, ApiError> {
    let patch = RecordPatch::Spending(json.into_inner());
    update_record(&request, store.get_ref(), &authenticator, path.into_inner(), patch).await
}

#[delete("/user/{id}/spendings/{spending_id}")]
async fn delete_spending(
    request: HttpRequest,
    store: web::Data<dyn UserStore>,
    authenticator: web::Data<Authenticator>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    remove_record(
        &request,
        store.get_ref(),
        &authenticator,
        path.into_inner(),
        RecordKind::Spending,
    )
    .await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(add_bill)
        .service(update_bill)
        .service(delete_bill)
        .service(add_investment)
        .service(update_investment)
        .service(delete_investment)
        .service(add_spending)
        .service(update_spending)
        .service(delete_spending);
}
