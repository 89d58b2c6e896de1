//! Customer HTTP endpoints.
//!
//! Validation failures answer 400 with a `field -> message` map, unknown
//! customers answer 404 with a timestamped error body, anything else is a 500
//! whose detail stays in the logs.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use membership_core::domain::customer::{Customer, CustomerDraft, CustomerId};
use membership_core::errors::{ApplicationError, FieldErrors, InterfaceError};
use membership_core::validation::{EMAIL_REQUIRED, NAME_REQUIRED};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::store::CustomerStore;

const INVALID_ID: &str = "Customer id must be a UUID";

#[derive(Clone)]
pub struct CustomerState {
    store: CustomerStore,
}

pub fn router(store: CustomerStore) -> Router {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/customers/by-name", get(get_customer_by_name))
        .route("/customers/by-email", get(get_customer_by_email))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(CustomerState { store })
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    timestamp: String,
    status: u16,
    error: &'static str,
    message: String,
}

impl ErrorBody {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message,
        }
    }
}

/// An interface error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest {
            fields: FieldErrors::single(field, message),
            correlation_id: new_correlation_id(),
        })
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(new_correlation_id()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            InterfaceError::BadRequest { fields, correlation_id } => {
                warn!(
                    event_name = "customer.request_rejected",
                    correlation_id = %correlation_id,
                    fields = %fields,
                    "customer request failed validation"
                );
                (StatusCode::BAD_REQUEST, Json(fields.to_map())).into_response()
            }
            InterfaceError::NotFound { message, correlation_id } => {
                warn!(
                    event_name = "customer.not_found",
                    correlation_id = %correlation_id,
                    detail = %message,
                    "customer lookup missed"
                );
                let body = ErrorBody::new(StatusCode::NOT_FOUND, message);
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            error @ InterfaceError::Internal { .. } => {
                error!(
                    event_name = "customer.internal_error",
                    correlation_id = %error.correlation_id(),
                    error = %error,
                    "customer request failed"
                );
                let body = ErrorBody::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error.user_message().to_owned(),
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

pub async fn create_customer(
    State(state): State<CustomerState>,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(draft) = payload.map_err(body_rejected)?;
    let customer = state.store.create(draft).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<CustomerState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get_by_id(id).await?))
}

pub async fn get_customer_by_name(
    State(state): State<CustomerState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Customer>, ApiError> {
    let name = query.name.ok_or_else(|| ApiError::bad_request("name", NAME_REQUIRED))?;
    Ok(Json(state.store.get_by_name(&name).await?))
}

pub async fn get_customer_by_email(
    State(state): State<CustomerState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Customer>, ApiError> {
    let email = query.email.ok_or_else(|| ApiError::bad_request("email", EMAIL_REQUIRED))?;
    Ok(Json(state.store.get_by_email(&email).await?))
}

pub async fn update_customer(
    State(state): State<CustomerState>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id(&id)?;
    let Json(draft) = payload.map_err(body_rejected)?;
    Ok(Json(state.store.update(id, draft).await?))
}

pub async fn delete_customer(
    State(state): State<CustomerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<CustomerId, ApiError> {
    raw.parse::<CustomerId>().map_err(|_| ApiError::bad_request("id", INVALID_ID))
}

fn body_rejected(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("body", rejection.body_text())
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
