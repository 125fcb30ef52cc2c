// Rust guideline compliant 2026-10-19

//! HTTP surface of the ledger.
//!
//! Builds the axum router over a shared [`ServiceLedger`]. Handlers only parse
//! and render; every rule lives in the `ledger` crate.
//!
//! | Method | Path                       | Success                      |
//! |--------|----------------------------|------------------------------|
//! | POST   | `/register`                | 201 `{message, user_id}`     |
//! | POST   | `/deposit`                 | 200 `{message, balance}`     |
//! | POST   | `/withdraw`                | 200 `{message, balance}`     |
//! | POST   | `/transfer`                | 200 `{message, balance}`     |
//! | GET    | `/balance/:user_id`        | 200 `{balance}`              |
//! | GET    | `/transactions/:user_id`   | 200 `{transactions}`         |
//! | GET    | `/health`                  | 200 `{status}`               |
//!
//! Failures render as `{"error": msg}` with the status from [`ApiError`].

use std::str::FromStr as _;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use domain::{Amount, LedgerError, UserId};
use fraud_heuristic::FraudHeuristic;
use ledger::Ledger;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::system_clock::SystemClock;

/// Ledger as wired by the service: wall clock plus the fraud heuristic.
pub type ServiceLedger = Ledger<Arc<SystemClock>, FraudHeuristic<Arc<SystemClock>>>;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The one ledger instance all requests operate on.
    pub ledger: Arc<ServiceLedger>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the router with every ledger route, permissive CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/register", post(register_handler))
        .route("/deposit", post(deposit_handler))
        .route("/withdraw", post(withdraw_handler))
        .route("/transfer", post(transfer_handler))
        .route("/balance/:user_id", get(balance_handler))
        .route("/transactions/:user_id", get(transactions_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An error rendered as `{"error": msg}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match err {
            LedgerError::InvalidArgument { .. } | LedgerError::InsufficientFunds { .. } => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::LimitExceeded { .. } => StatusCode::FORBIDDEN,
            LedgerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        };
        Self { status, message: err.to_string() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Body of `/deposit` and `/withdraw`.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    /// Target account.
    pub user_id: Option<String>,
    /// JSON number or numeric string.
    pub amount: Option<Value>,
}

/// Body of `/transfer`.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Account debited.
    pub sender_id: Option<String>,
    /// Account credited.
    pub recipient_id: Option<String>,
    /// JSON number or numeric string.
    pub amount: Option<Value>,
}

/// Parse an id from a request body. Anything but a UUID is an invalid argument.
fn body_user_id(raw: Option<&str>, field: &str) -> Result<UserId, LedgerError> {
    let raw = raw.ok_or_else(|| LedgerError::invalid(format!("{field} is required")))?;
    UserId::from_str(raw).map_err(|err| LedgerError::invalid(format!("{field} is not a valid user id: {err}")))
}

/// Parse an amount. Missing counts as zero, which the ledger then rejects.
fn parse_amount(raw: Option<&Value>) -> Result<Amount, LedgerError> {
    let text = match raw {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(_) => return Err(LedgerError::invalid("amount must be a number")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|err| LedgerError::invalid(format!("amount must be a number: {err}")))
}

/// Parse an id from the URL path. Anything but a UUID cannot name a user.
fn path_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_str(raw).map_err(|err| ApiError::not_found(format!("user {raw} not found: {err}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn register_handler(State(state): State<AppState>) -> impl IntoResponse {
    let user_id = state.ledger.register();
    (StatusCode::CREATED, Json(json!({ "message": "User registered", "user_id": user_id })))
}

async fn deposit_handler(
    State(state): State<AppState>,
    body: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let user_id = body_user_id(req.user_id.as_deref(), "user_id")?;
    let amount = parse_amount(req.amount.as_ref())?;
    let balance = state.ledger.deposit(user_id, amount)?;
    Ok(Json(json!({ "message": "Deposit successful", "balance": balance })))
}

async fn withdraw_handler(
    State(state): State<AppState>,
    body: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let user_id = body_user_id(req.user_id.as_deref(), "user_id")?;
    let amount = parse_amount(req.amount.as_ref())?;
    let balance = state.ledger.withdraw(user_id, amount)?;
    Ok(Json(json!({ "message": "Withdrawal successful", "balance": balance })))
}

async fn transfer_handler(
    State(state): State<AppState>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let sender = body_user_id(req.sender_id.as_deref(), "sender_id")?;
    let recipient = body_user_id(req.recipient_id.as_deref(), "recipient_id")?;
    let amount = parse_amount(req.amount.as_ref())?;
    let balance = state.ledger.transfer(sender, recipient, amount)?;
    Ok(Json(json!({ "message": "Transfer successful", "balance": balance })))
}

async fn balance_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let balance = state.ledger.balance(path_user_id(&user_id)?)?;
    Ok(Json(json!({ "balance": balance })))
}

async fn transactions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let transactions = state.ledger.history(path_user_id(&user_id)?)?;
    Ok(Json(json!({ "transactions": transactions })))
}

/// Liveness probe.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
