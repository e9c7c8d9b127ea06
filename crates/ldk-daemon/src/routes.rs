//! Axum router and all HTTP handlers for ldk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are thin: parse, call the desk, serialize.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use ldk_config::Settings;
use ldk_export::ExportOutcome;
use ldk_reminder::{DueReminder, ReminderResponse};
use ldk_runtime::{ClientView, ResponseOutcome};
use ldk_schemas::{
    Catalog, ClientInput, LifecycleStatus, MeridianFilter, MeridianItem, MeridianItemInput,
    MeridianOrder, MeridianOrderSummary, MeridianStatus, MklFilter, MklOrder, MklOrderInput,
    MklStatus, ProductEntry, ReminderChannel,
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::{
    api_types::{
        ClientQuery, DeletedResponse, HealthResponse, OrderQuery, ProductNameRequest,
        StatusChangeRequest,
    },
    error::ApiResult,
    state::{AppState, BusMsg},
};

type Shared = State<Arc<AppState>>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        .route("/v1/settings", get(settings_get).put(settings_put))
        .route("/v1/clients", get(clients_list).post(clients_create))
        .route("/v1/clients/:id", put(clients_update).delete(clients_delete))
        .route("/v1/products/:catalog", get(products_list).post(products_add))
        .route(
            "/v1/products/:catalog/:id",
            put(products_rename).delete(products_delete),
        )
        .route("/v1/mkl/orders", get(mkl_list).post(mkl_create))
        .route(
            "/v1/mkl/orders/:id",
            get(mkl_get).put(mkl_update).delete(mkl_delete),
        )
        .route("/v1/mkl/orders/:id/status", post(mkl_status))
        .route("/v1/meridian/orders", get(meridian_list).post(meridian_create))
        .route(
            "/v1/meridian/orders/:id",
            get(meridian_get).delete(meridian_delete),
        )
        .route("/v1/meridian/orders/:id/status", post(meridian_status))
        .route(
            "/v1/meridian/orders/:id/items",
            get(items_list).post(items_add),
        )
        .route(
            "/v1/meridian/items/:id",
            put(items_update).delete(items_delete),
        )
        .route("/v1/export/:catalog", post(export_catalog))
        .route("/v1/reminders/evaluate", post(reminders_evaluate))
        .route("/v1/reminders/:channel/respond", post(reminders_respond))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): Shared) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// /v1/settings
// ---------------------------------------------------------------------------

pub(crate) async fn settings_get(State(st): Shared) -> Json<Settings> {
    Json(st.settings_snapshot().await)
}

/// Replace the settings. Malformed trigger times are rejected; other values
/// are brought into range. Persisted before the in-memory copy changes.
pub(crate) async fn settings_put(
    State(st): Shared,
    Json(next): Json<Settings>,
) -> ApiResult<Json<Settings>> {
    let next = next.validate()?;
    if let Some(path) = &st.settings_path {
        ldk_config::save_settings(path, &next)?;
    }
    *st.settings.write().await = next.clone();
    info!("settings updated");
    Ok(Json(next))
}

// ---------------------------------------------------------------------------
// /v1/clients
// ---------------------------------------------------------------------------

pub(crate) async fn clients_list(
    State(st): Shared,
    Query(q): Query<ClientQuery>,
) -> ApiResult<Json<Vec<ClientView>>> {
    Ok(Json(st.desk.list_clients(q.q.as_deref()).await?))
}

pub(crate) async fn clients_create(
    State(st): Shared,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<ClientView>)> {
    Ok((StatusCode::CREATED, Json(st.desk.create_client(&input).await?)))
}

pub(crate) async fn clients_update(
    State(st): Shared,
    Path(id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<ClientView>> {
    Ok(Json(st.desk.update_client(id, &input).await?))
}

pub(crate) async fn clients_delete(
    State(st): Shared,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    st.desk.delete_client(id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ---------------------------------------------------------------------------
// /v1/products/:catalog
// ---------------------------------------------------------------------------

pub(crate) async fn products_list(
    State(st): Shared,
    Path(catalog): Path<String>,
) -> ApiResult<Json<Vec<ProductEntry>>> {
    let catalog = Catalog::parse(&catalog)?;
    Ok(Json(st.desk.list_products(catalog).await?))
}

pub(crate) async fn products_add(
    State(st): Shared,
    Path(catalog): Path<String>,
    Json(body): Json<ProductNameRequest>,
) -> ApiResult<(StatusCode, Json<ProductEntry>)> {
    let catalog = Catalog::parse(&catalog)?;
    let p = st.desk.add_product(catalog, &body.name).await?;
    Ok((StatusCode::CREATED, Json(p)))
}

pub(crate) async fn products_rename(
    State(st): Shared,
    Path((catalog, id)): Path<(String, i64)>,
    Json(body): Json<ProductNameRequest>,
) -> ApiResult<Json<ProductEntry>> {
    let catalog = Catalog::parse(&catalog)?;
    Ok(Json(st.desk.rename_product(catalog, id, &body.name).await?))
}

pub(crate) async fn products_delete(
    State(st): Shared,
    Path((catalog, id)): Path<(String, i64)>,
) -> ApiResult<Json<DeletedResponse>> {
    let catalog = Catalog::parse(&catalog)?;
    st.desk.delete_product(catalog, id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ---------------------------------------------------------------------------
// /v1/mkl/orders
// ---------------------------------------------------------------------------

pub(crate) async fn mkl_list(
    State(st): Shared,
    Query(q): Query<OrderQuery>,
) -> ApiResult<Json<Vec<MklOrder>>> {
    let status = q.status.as_deref().map(MklStatus::parse).transpose()?;
    let filter = MklFilter { status, query: q.q };
    Ok(Json(st.desk.list_mkl_orders(&filter).await?))
}

pub(crate) async fn mkl_get(State(st): Shared, Path(id): Path<i64>) -> ApiResult<Json<MklOrder>> {
    Ok(Json(st.desk.get_mkl_order(id).await?))
}

pub(crate) async fn mkl_create(
    State(st): Shared,
    Json(input): Json<MklOrderInput>,
) -> ApiResult<(StatusCode, Json<MklOrder>)> {
    Ok((StatusCode::CREATED, Json(st.desk.create_mkl_order(&input).await?)))
}

pub(crate) async fn mkl_update(
    State(st): Shared,
    Path(id): Path<i64>,
    Json(input): Json<MklOrderInput>,
) -> ApiResult<Json<MklOrder>> {
    Ok(Json(st.desk.update_mkl_order(id, &input).await?))
}

pub(crate) async fn mkl_delete(
    State(st): Shared,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    st.desk.delete_mkl_order(id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

pub(crate) async fn mkl_status(
    State(st): Shared,
    Path(id): Path<i64>,
    Json(body): Json<StatusChangeRequest>,
) -> ApiResult<Json<MklOrder>> {
    let status = MklStatus::parse(&body.status)?;
    Ok(Json(st.desk.set_mkl_status(id, status).await?))
}

// ---------------------------------------------------------------------------
// /v1/meridian/orders
// ---------------------------------------------------------------------------

pub(crate) async fn meridian_list(
    State(st): Shared,
    Query(q): Query<OrderQuery>,
) -> ApiResult<Json<Vec<MeridianOrderSummary>>> {
    let status = q.status.as_deref().map(MeridianStatus::parse).transpose()?;
    Ok(Json(
        st.desk.list_meridian_orders(&MeridianFilter { status }).await?,
    ))
}

pub(crate) async fn meridian_get(
    State(st): Shared,
    Path(id): Path<i64>,
) -> ApiResult<Json<MeridianOrder>> {
    Ok(Json(st.desk.get_meridian_order(id).await?))
}

pub(crate) async fn meridian_create(
    State(st): Shared,
) -> ApiResult<(StatusCode, Json<MeridianOrder>)> {
    Ok((StatusCode::CREATED, Json(st.desk.create_meridian_order().await?)))
}

pub(crate) async fn meridian_delete(
    State(st): Shared,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    st.desk.delete_meridian_order(id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

pub(crate) async fn meridian_status(
    State(st): Shared,
    Path(id): Path<i64>,
    Json(body): Json<StatusChangeRequest>,
) -> ApiResult<Json<MeridianOrder>> {
    let status = MeridianStatus::parse(&body.status)?;
    Ok(Json(st.desk.set_meridian_status(id, status).await?))
}

pub(crate) async fn items_list(
    State(st): Shared,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Vec<MeridianItem>>> {
    Ok(Json(st.desk.list_meridian_items(order_id).await?))
}

pub(crate) async fn items_add(
    State(st): Shared,
    Path(order_id): Path<i64>,
    Json(input): Json<MeridianItemInput>,
) -> ApiResult<(StatusCode, Json<MeridianItem>)> {
    let item = st.desk.add_meridian_item(order_id, &input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub(crate) async fn items_update(
    State(st): Shared,
    Path(id): Path<i64>,
    Json(input): Json<MeridianItemInput>,
) -> ApiResult<Json<MeridianItem>> {
    Ok(Json(st.desk.update_meridian_item(id, &input).await?))
}

pub(crate) async fn items_delete(
    State(st): Shared,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    st.desk.delete_meridian_item(id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ---------------------------------------------------------------------------
// POST /v1/export/:catalog
// ---------------------------------------------------------------------------

pub(crate) async fn export_catalog(
    State(st): Shared,
    Path(catalog): Path<String>,
) -> ApiResult<Json<ExportOutcome>> {
    let catalog = Catalog::parse(&catalog)?;
    let settings = st.settings_snapshot().await;
    Ok(Json(st.desk.export_unordered(catalog, &settings).await?))
}

// ---------------------------------------------------------------------------
// /v1/reminders
// ---------------------------------------------------------------------------

/// On-demand evaluation, same rules as the tick. Due reminders are also
/// published on the bus.
pub(crate) async fn reminders_evaluate(State(st): Shared) -> ApiResult<Json<Vec<DueReminder>>> {
    let settings = st.settings_snapshot().await;
    let due = st.desk.evaluate_reminders(&settings).await?;
    for d in &due {
        let _ = st.bus.send(BusMsg::Reminder(d.clone()));
    }
    Ok(Json(due))
}

pub(crate) async fn reminders_respond(
    State(st): Shared,
    Path(channel): Path<String>,
    Json(response): Json<ReminderResponse>,
) -> ApiResult<Json<ResponseOutcome>> {
    let channel = ReminderChannel::parse(&channel)?;
    Ok(Json(st.desk.apply_response(channel, response).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): Shared) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Reminder(_) => "reminder",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
