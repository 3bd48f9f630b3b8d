//! HTTP surface for pools and the swap protocol

use crate::error::SwapError;
use crate::orchestrator::{SwapEstimate, SwapOrchestrator};
use crate::pools::PoolService;
use bytes::Bytes;
use config::service::server::REQUEST_ID_HEADER;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info, warn};
use types::{CreatePoolRequest, LiquidityPool, SwapIntentRequest, ValidationError};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Shared handles for request handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub orchestrator: Arc<SwapOrchestrator>,
    pub pools: Arc<PoolService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSwapRequest {
    pub swap_claim_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSwapResponse {
    pub transaction_id: String,
}

/// Error body returned with every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// All routes, with unmatched requests answered as JSON errors
pub fn routes(state: ApiState) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let request_id = warp::any().map(|| Uuid::new_v4().to_string());
    let with_state = warp::any().map(move || state.clone());
    let body = warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes());

    let create_pool = warp::path!("pools" / String)
        .and(warp::post())
        .and(body.clone())
        .and(request_id.clone())
        .and(with_state.clone())
        .and_then(handle_create_pool);

    let get_pool = warp::path!("pools" / String)
        .and(warp::get())
        .and(request_id.clone())
        .and(with_state.clone())
        .and_then(handle_get_pool);

    let estimate = warp::path!("swap" / "estimate")
        .and(warp::post())
        .and(body.clone())
        .and(request_id.clone())
        .and(with_state.clone())
        .and_then(handle_estimate);

    let submit = warp::path!("swap" / "submit")
        .and(warp::post())
        .and(body)
        .and(request_id.clone())
        .and(with_state.clone())
        .and_then(handle_submit);

    let transaction = warp::path!("swap" / "transactions" / String)
        .and(warp::get())
        .and(request_id.clone())
        .and(with_state)
        .and_then(handle_get_transaction);

    let health = warp::path!("health")
        .and(warp::get())
        .and(request_id)
        .map(|request_id: String| {
            json_response(
                &request_id,
                StatusCode::OK,
                &serde_json::json!({
                    "status": "running",
                    "service": "orchard-swap",
                    "version": env!("CARGO_PKG_VERSION")
                }),
            )
        });

    create_pool
        .or(get_pool)
        .unify()
        .or(estimate)
        .unify()
        .or(submit)
        .unify()
        .or(transaction)
        .unify()
        .or(health)
        .unify()
        .recover(handle_rejection)
        .unify()
}

async fn handle_create_pool(
    name: String,
    body: Bytes,
    request_id: String,
    state: ApiState,
) -> Result<Response, Rejection> {
    info!(%request_id, pool = %name, "Received create pool request");
    Ok(match create_pool_from_body(&state, &name, &body).await {
        Ok(_) => empty_response(&request_id, StatusCode::CREATED),
        Err(e) => error_response(&request_id, &e),
    })
}

async fn handle_get_pool(
    name: String,
    request_id: String,
    state: ApiState,
) -> Result<Response, Rejection> {
    info!(%request_id, pool = %name, "Received get pool request");
    Ok(match state.pools.get_pool(&name).await {
        Ok(pool) => json_response(&request_id, StatusCode::OK, &pool),
        Err(e) => error_response(&request_id, &e),
    })
}

async fn handle_estimate(
    body: Bytes,
    request_id: String,
    state: ApiState,
) -> Result<Response, Rejection> {
    info!(%request_id, "Received estimate request");
    Ok(match estimate_from_body(&state, &request_id, &body).await {
        Ok(estimate) => json_response(&request_id, StatusCode::OK, &estimate),
        Err(e) => error_response(&request_id, &e),
    })
}

async fn handle_submit(
    body: Bytes,
    request_id: String,
    state: ApiState,
) -> Result<Response, Rejection> {
    info!(%request_id, "Received submit request");
    Ok(match submit_from_body(&state, &body).await {
        Ok(transaction_id) => json_response(
            &request_id,
            StatusCode::OK,
            &SubmitSwapResponse { transaction_id },
        ),
        Err(e) => error_response(&request_id, &e),
    })
}

async fn handle_get_transaction(
    transaction_id: String,
    request_id: String,
    state: ApiState,
) -> Result<Response, Rejection> {
    Ok(
        match state.orchestrator.get_transaction(&transaction_id).await {
            Ok(record) => json_response(&request_id, StatusCode::OK, &record),
            Err(e) => error_response(&request_id, &e),
        },
    )
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let request_id = Uuid::new_v4().to_string();
    let (status, error_type, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found.")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "BAD_REQUEST",
            "Method not allowed.",
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "BAD_REQUEST",
            "Request body too large.",
        )
    } else {
        warn!(?rejection, "Unhandled rejection");
        (StatusCode::BAD_REQUEST, "BAD_REQUEST", "Bad request.")
    };

    Ok(json_response(
        &request_id,
        status,
        &ErrorResponse {
            error_type: error_type.to_string(),
            message: message.to_string(),
        },
    ))
}

async fn create_pool_from_body(
    state: &ApiState,
    name: &str,
    body: &[u8],
) -> Result<LiquidityPool, SwapError> {
    let request: CreatePoolRequest = parse_body(body)?;
    state.pools.create_pool(name, &request).await
}

async fn estimate_from_body(
    state: &ApiState,
    request_id: &str,
    body: &[u8],
) -> Result<SwapEstimate, SwapError> {
    let request: SwapIntentRequest = parse_body(body)?;
    let intent = request.validate()?;
    state.orchestrator.estimate(request_id, &intent).await
}

async fn submit_from_body(state: &ApiState, body: &[u8]) -> Result<String, SwapError> {
    let request: SubmitSwapRequest = parse_body(body)?;
    let token = request
        .swap_claim_token
        .ok_or(ValidationError::MissingFields)?;
    state.orchestrator.submit(&token).await
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, SwapError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Unreadable request body");
        SwapError::from(ValidationError::MissingFields)
    })
}

/// HTTP status for a service error
pub fn status_for(err: &SwapError) -> StatusCode {
    match err.error_type() {
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "CONFLICT" => StatusCode::CONFLICT,
        "BAD_REQUEST" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(request_id: &str, err: &SwapError) -> Response {
    let status = status_for(err);
    if err.is_client_error() {
        warn!(%request_id, %status, error = %err, "Request rejected");
    } else {
        error!(%request_id, %status, error = %err, "Request failed");
    }

    // Operational details stay in the logs
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        "Internal error.".to_string()
    };
    json_response(
        request_id,
        status,
        &ErrorResponse {
            error_type: err.error_type().to_string(),
            message,
        },
    )
}

fn json_response<T: Serialize>(request_id: &str, status: StatusCode, body: &T) -> Response {
    let reply = warp::reply::with_status(warp::reply::json(body), status);
    warp::reply::with_header(reply, REQUEST_ID_HEADER, request_id).into_response()
}

fn empty_response(request_id: &str, status: StatusCode) -> Response {
    let reply = warp::reply::with_status(warp::reply(), status);
    warp::reply::with_header(reply, REQUEST_ID_HEADER, request_id).into_response()
}
