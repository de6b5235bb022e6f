use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use axum_extra::extract::WithRejection;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::envelope::ApiResponse;
use super::extract::Params;
use crate::application::address_service::AddressService;
use crate::application::carousel_service::CarouselService;
use crate::application::order_query_service::OrderQueryService;
use crate::application::order_service::OrderService;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::errors::AppError;
use foodie_types::domain::address::{Address, AddressFields};
use foodie_types::domain::carousel::Carousel;
use foodie_types::domain::order::{OrderStatus, OrderStatusCounts, OrderSummary};
use foodie_types::domain::paging::{PagedResult, DEFAULT_PAGE_SIZE};
use foodie_types::ports::Store;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub max_upload_bytes: usize,
}

impl HttpServerConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Services shared by every handler, all over the same store.
pub struct AppState<R: Store> {
    pub addresses: Arc<AddressService<R>>,
    pub orders: Arc<OrderService<R>>,
    pub queries: Arc<OrderQueryService<R>>,
    pub carousels: Arc<CarouselService<R>>,
}

impl<R: Store> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            addresses: self.addresses.clone(),
            orders: self.orders.clone(),
            queries: self.queries.clone(),
            carousels: self.carousels.clone(),
        }
    }
}

impl<R: Store> AppState<R> {
    pub fn new(repo: R, default_page_size: u32) -> Self {
        Self {
            addresses: Arc::new(AddressService::new(repo.clone())),
            orders: Arc::new(OrderService::new(repo.clone())),
            queries: Arc::new(
                OrderQueryService::new(repo.clone()).with_default_page_size(default_page_size),
            ),
            carousels: Arc::new(CarouselService::new(repo)),
        }
    }

    pub fn with_defaults(repo: R) -> Self {
        Self::new(repo, DEFAULT_PAGE_SIZE)
    }
}

pub struct HttpServer<R: Store> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct UserParams {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddressParams {
    pub user_id: Option<String>,
    pub address_id: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderParams {
    pub user_id: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    pub user_id: Option<String>,
    pub order_status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Deserialize)]
pub struct CarouselParams {
    pub is_show: Option<bool>,
}

#[derive(Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(flatten)]
    pub fields: AddressFields,
}

fn text(v: Option<String>) -> String {
    v.unwrap_or_default()
}

// Unparseable paging values fall back to the defaults.
fn number(v: Option<String>) -> Option<i64> {
    v.and_then(|s| s.trim().parse().ok())
}

fn status_filter(v: Option<String>) -> Result<Option<OrderStatus>, AppError> {
    match v.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => OrderStatus::from_str(s)
            .map(Some)
            .map_err(|e| AppError::InvalidInput(e.to_string())),
    }
}

/// Body-limit rejections become the fixed upload message.
async fn rewrite_payload_too_large(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge.into_response();
    }
    response
}

impl<R: Store> HttpServer<R> {
    pub async fn new(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self { state, config })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/address/list", post(list_addresses::<R>))
            .route("/address/add", post(add_address::<R>))
            .route("/address/update", post(update_address::<R>))
            .route("/address/delete", post(delete_address::<R>))
            .route("/address/set_default", post(set_default_address::<R>))
            .route("/myorders/status_counts", post(status_counts::<R>))
            .route("/myorders/query", post(query_orders::<R>))
            .route("/myorders/deliver", get(deliver::<R>))
            .route("/myorders/confirm_receive", post(confirm_receive::<R>))
            .route("/myorders/delete", post(delete_order::<R>))
            .route("/myorders/trend", post(trend::<R>))
            .route("/index/carousel", get(carousels::<R>))
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(middleware::map_response(rewrite_payload_too_large))
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn list_addresses<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<UserParams>,
) -> Result<ApiResponse<Vec<Address>>, AppError> {
    let list = state.addresses.list_addresses(&text(p.user_id)).await?;
    Ok(ApiResponse::ok(list))
}

async fn add_address<R: Store>(
    State(state): State<AppState<R>>,
    WithRejection(Json(body), _): WithRejection<Json<AddressRequest>, AppError>,
) -> Result<ApiResponse<Address>, AppError> {
    let address = state
        .addresses
        .add_address(&body.user_id, body.fields)
        .await?;
    Ok(ApiResponse::ok(address))
}

async fn update_address<R: Store>(
    State(state): State<AppState<R>>,
    WithRejection(Json(body), _): WithRejection<Json<AddressRequest>, AppError>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .addresses
        .update_address(&body.user_id, &text(body.address_id), body.fields)
        .await?;
    Ok(ApiResponse::empty())
}

async fn delete_address<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<AddressParams>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .addresses
        .delete_address(&text(p.user_id), &text(p.address_id))
        .await?;
    Ok(ApiResponse::empty())
}

async fn set_default_address<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<AddressParams>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .addresses
        .set_default_address(&text(p.user_id), &text(p.address_id))
        .await?;
    Ok(ApiResponse::empty())
}

async fn status_counts<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<UserParams>,
) -> Result<ApiResponse<OrderStatusCounts>, AppError> {
    let counts = state.queries.status_counts(&text(p.user_id)).await?;
    Ok(ApiResponse::ok(counts))
}

async fn query_orders<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<QueryParams>,
) -> Result<ApiResponse<PagedResult<OrderSummary>>, AppError> {
    let status = status_filter(p.order_status)?;
    let grid = state
        .queries
        .query_orders(&text(p.user_id), status, number(p.page), number(p.page_size))
        .await?;
    Ok(ApiResponse::ok(grid))
}

async fn trend<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<QueryParams>,
) -> Result<ApiResponse<PagedResult<OrderSummary>>, AppError> {
    let grid = state
        .queries
        .orders_trend(&text(p.user_id), number(p.page), number(p.page_size))
        .await?;
    Ok(ApiResponse::ok(grid))
}

// Stands in for the merchant's fulfilment system.
async fn deliver<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<OrderParams>,
) -> Result<ApiResponse<()>, AppError> {
    state.orders.mark_delivered(&text(p.order_id)).await?;
    Ok(ApiResponse::empty())
}

async fn confirm_receive<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<OrderParams>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .orders
        .confirm_received(&text(p.user_id), &text(p.order_id))
        .await?;
    Ok(ApiResponse::empty())
}

async fn delete_order<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<OrderParams>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .orders
        .delete_order(&text(p.user_id), &text(p.order_id))
        .await?;
    Ok(ApiResponse::empty())
}

async fn carousels<R: Store>(
    State(state): State<AppState<R>>,
    Params(p): Params<CarouselParams>,
) -> Result<ApiResponse<Vec<Carousel>>, AppError> {
    let list = state.carousels.query_all(p.is_show.unwrap_or(true)).await?;
    Ok(ApiResponse::ok(list))
}
