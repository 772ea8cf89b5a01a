//! REST API for the truck packing service.
//!
//! Provides HTTP endpoints for packing a cargo list into a truck, streaming
//! the placement steps, and managing saved configurations.
//! Uses Axum as the web framework and supports CORS.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::intake::{AdmittedLoad, IntakeError, IntakeLimits, admit};
use crate::layout::{LoadMetrics, PositionOverrides, apply_overrides};
use crate::model::{CargoItem, CargoKind, Dimensions, TruckConfig};
use crate::optimizer::{
    PackingConfig, PackingResult, UnpackedReason, pack_cargo_with_config,
    pack_cargo_with_progress,
};
use crate::store::{ConfigurationStore, SavedConfiguration, StoreError};
use crate::types::Vec3;

/// Shared state of all handlers.
#[derive(Clone)]
pub struct ApiState {
    optimizer_config: OptimizerConfig,
    store: Arc<dyn ConfigurationStore>,
}

impl ApiState {
    pub fn new(optimizer_config: OptimizerConfig, store: Arc<dyn ConfigurationStore>) -> Self {
        Self {
            optimizer_config,
            store,
        }
    }

    fn packing_config(&self) -> PackingConfig {
        self.optimizer_config.packing_config()
    }

    fn intake_limits(&self) -> IntakeLimits {
        self.optimizer_config.intake_limits()
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>truck-packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({ url: "/docs/openapi.json", dom_id: "#swagger-ui" });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
///
/// `overrides` pins packed items to manual display positions, keyed by cargo id.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "truck": { "length": 2.4, "width": 1.2, "height": 1.2 },
        "cargo": [
            { "id": "a", "type": "standard", "dims": { "length": 1.2, "width": 1.2, "height": 1.2 } },
            { "id": "b", "type": "custom", "dims": { "length": 1.2, "width": 1.2, "height": 1.2 }, "delivery_stop": 1 }
        ],
        "overrides": { "b": [1.2, 0.0, 0.0] }
    })
)]
pub struct PackRequest {
    pub truck: Dimensions,
    pub cargo: Vec<CargoItem>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub overrides: HashMap<String, (f64, f64, f64)>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    load: AdmittedLoad,
    overrides: PositionOverrides,
}

impl PackRequest {
    fn into_validated(self, limits: &IntakeLimits) -> Result<ValidatedPackRequest, IntakeError> {
        let load = admit(self.truck, self.cargo, limits)?;
        let overrides = self
            .overrides
            .into_iter()
            .map(|(id, pos)| (id, Vec3::from(pos)))
            .collect();
        Ok(ValidatedPackRequest { load, overrides })
    }
}

/// Response structure of a packing run.
///
/// `packed` and `unpacked` follow the processing order (largest volume first),
/// not the request order.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub truck: Dimensions,
    pub packed: Vec<PackedCargo>,
    pub unpacked: Vec<UnpackedCargo>,
    pub is_complete: bool,
    pub metrics: LoadMetrics,
    /// Utilization with one decimal, e.g. "12.5"
    pub utilization_label: String,
}

/// Single placed item in the response.
///
/// # Fields
/// * `pos` - Display position (manual override if present)
/// * `packed_pos` - Position chosen by the packer
/// * `overridden` - Whether `pos` comes from an override
#[derive(Serialize, ToSchema)]
pub struct PackedCargo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CargoKind,
    pub name: Option<String>,
    pub color: String,
    pub delivery_stop: Option<u32>,
    pub dims: Dimensions,
    #[schema(value_type = [f64; 3], example = json!([1.2, 0.0, 0.0]))]
    pub pos: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([1.2, 0.0, 0.0]))]
    pub packed_pos: (f64, f64, f64),
    pub overridden: bool,
}

/// Item without space in the truck.
#[derive(Serialize, ToSchema)]
pub struct UnpackedCargo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CargoKind,
    pub name: Option<String>,
    pub color: String,
    pub delivery_stop: Option<u32>,
    pub dims: Dimensions,
    pub reason_code: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConfigurationList {
    pub names: Vec<String>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn intake_error(err: IntakeError) -> Response {
    let error = match err {
        IntakeError::InvalidTruck(_) => "Invalid truck configuration",
        _ => "Invalid cargo data",
    };
    error_response(StatusCode::UNPROCESSABLE_ENTITY, error, err.to_string())
}

fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::NotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Unknown configuration", err.to_string())
        }
        StoreError::EmptyName => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid name", err.to_string())
        }
        other => {
            eprintln!("❌ Configuration store failed: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration store unavailable",
                other.to_string(),
            )
        }
    }
}

/// Runs a store operation on the blocking thread pool.
async fn with_store<T, F>(state: &ApiState, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ConfigurationStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|err| StoreError::Unavailable(err.to_string()))?
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    limits: &IntakeLimits,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = payload.map_err(json_deserialize_error)?;
    payload.into_validated(limits).map_err(intake_error)
}

impl PackResponse {
    /// Builds the response from raw packer output and display overrides.
    ///
    /// Metrics always use the raw positions.
    pub fn from_packing_result(
        truck: TruckConfig,
        result: PackingResult,
        overrides: &PositionOverrides,
    ) -> Self {
        let metrics = LoadMetrics::from_packed(&truck, &result.packed);
        let shown = apply_overrides(&result.packed, overrides);
        let is_complete = result.is_complete();
        let reason = UnpackedReason::NoRemainingSpace;

        let packed = result
            .packed
            .into_iter()
            .zip(shown)
            .map(|(raw, display)| PackedCargo {
                overridden: overrides.get(raw.id()).is_some(),
                pos: display.position.as_tuple(),
                packed_pos: raw.position.as_tuple(),
                id: raw.item.id,
                kind: raw.item.kind,
                name: raw.item.name,
                color: raw.item.color,
                delivery_stop: raw.item.delivery_stop,
                dims: raw.item.dims,
            })
            .collect();

        let unpacked = result
            .unpacked
            .into_iter()
            .map(|item| UnpackedCargo {
                id: item.id,
                kind: item.kind,
                name: item.name,
                color: item.color,
                delivery_stop: item.delivery_stop,
                dims: item.dims,
                reason_code: reason.code().to_string(),
                reason: reason.to_string(),
            })
            .collect();

        Self {
            truck,
            packed,
            unpacked,
            is_complete,
            utilization_label: metrics.utilization_label(),
            metrics,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_pack,
        handle_pack_stream,
        list_configurations,
        save_configuration,
        get_configuration,
        delete_configuration,
        configuration_layout
    ),
    components(
        schemas(
            PackRequest,
            PackResponse,
            PackedCargo,
            UnpackedCargo,
            ConfigurationList,
            ErrorResponse,
            CargoItem,
            CargoKind,
            Dimensions,
            LoadMetrics,
            SavedConfiguration
        )
    ),
    tags(
        (name = "packing", description = "Endpoints for packing a truck"),
        (name = "configurations", description = "Saved truck and cargo configurations")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pack", axum::routing::post(handle_pack))
        .route("/pack_stream", axum::routing::post(handle_pack_stream))
        .route(
            "/configurations",
            get(list_configurations).post(save_configuration),
        )
        .route(
            "/configurations/{name}",
            get(get_configuration).delete(delete_configuration),
        )
        .route("/configurations/{name}/layout", get(configuration_layout))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, state: ApiState) {
    let app = router(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    println!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /pack");
    println!("   - POST /pack_stream");
    println!("   - GET|POST /configurations");
    println!("   - GET|DELETE /configurations/{{name}}");
    println!("   - GET /configurations/{{name}}/layout");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Runs the packer on an admitted load and builds the response.
fn pack_load(
    load: AdmittedLoad,
    overrides: &PositionOverrides,
    config: PackingConfig,
) -> PackResponse {
    let (truck, cargo) = load.into_parts();
    let result = pack_cargo_with_config(&truck, cargo, config);
    println!(
        "📦 Result: {} packed, {} without space",
        result.packed_count(),
        result.unpacked_count()
    );
    PackResponse::from_packing_result(truck, result, overrides)
}

/// Handler for POST /pack endpoint.
///
/// Packs the cargo into the truck and returns placements, unpacked items and
/// utilization.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid truck or cargo",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload, &state.intake_limits()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    println!(
        "📥 New pack request: {} cargo items, {} overrides",
        request.load.cargo_count(),
        request.overrides.len()
    );
    let response = pack_load(request.load, &request.overrides, state.packing_config());
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams placement events as Server-Sent Events so viewers can animate the
/// loading sequence. Overrides in the request are ignored here.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid truck or cargo",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload, &state.intake_limits()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (truck, cargo) = request.load.into_parts();
    let packing_config = state.packing_config();
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        pack_cargo_with_progress(&truck, cargo, packing_config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver means the client left; remaining events are dropped.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for GET /configurations.
#[utoipa::path(
    get,
    path = "/configurations",
    responses((status = 200, description = "Names of saved configurations", body = ConfigurationList)),
    tag = "configurations"
)]
async fn list_configurations(State(state): State<ApiState>) -> Response {
    match with_store(&state, |store| store.list()).await {
        Ok(names) => Json(ConfigurationList { names }).into_response(),
        Err(err) => store_error(err),
    }
}

/// Handler for POST /configurations.
///
/// Stores truck and cargo under a name; an existing entry is replaced.
#[utoipa::path(
    post,
    path = "/configurations",
    request_body = SavedConfiguration,
    responses(
        (status = 201, description = "Configuration saved", body = SavedConfiguration),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid name, truck or cargo",
            body = ErrorResponse
        )
    ),
    tag = "configurations"
)]
async fn save_configuration(
    State(state): State<ApiState>,
    payload: Result<Json<SavedConfiguration>, JsonRejection>,
) -> Response {
    let Json(config) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let load = match admit(config.truck, config.cargo, &state.intake_limits()) {
        Ok(load) => load,
        Err(err) => return intake_error(err),
    };
    let (truck, cargo) = load.into_parts();
    let saved = SavedConfiguration {
        name: config.name.trim().to_string(),
        truck,
        cargo,
    };

    let to_store = saved.clone();
    match with_store(&state, move |store| store.save(to_store)).await {
        Ok(()) => {
            println!(
                "💾 Saved configuration '{}' ({} cargo items)",
                saved.name,
                saved.cargo.len()
            );
            (StatusCode::CREATED, Json(saved)).into_response()
        }
        Err(err) => store_error(err),
    }
}

/// Handler for GET /configurations/{name}.
#[utoipa::path(
    get,
    path = "/configurations/{name}",
    params(("name" = String, Path, description = "Name of the saved configuration")),
    responses(
        (status = 200, description = "Stored truck and cargo", body = SavedConfiguration),
        (status = NOT_FOUND, description = "Unknown configuration", body = ErrorResponse)
    ),
    tag = "configurations"
)]
async fn get_configuration(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match with_store(&state, move |store| store.load(&name)).await {
        Ok(config) => Json(config).into_response(),
        Err(err) => store_error(err),
    }
}

/// Handler for DELETE /configurations/{name}.
#[utoipa::path(
    delete,
    path = "/configurations/{name}",
    params(("name" = String, Path, description = "Name of the saved configuration")),
    responses(
        (status = 204, description = "Configuration deleted"),
        (status = NOT_FOUND, description = "Unknown configuration", body = ErrorResponse)
    ),
    tag = "configurations"
)]
async fn delete_configuration(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Response {
    let key = name.clone();
    match with_store(&state, move |store| store.delete(&key)).await {
        Ok(()) => {
            println!("🗑️ Deleted configuration '{}'", name.trim());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => store_error(err),
    }
}

/// Handler for GET /configurations/{name}/layout.
///
/// Packs the stored truck and cargo again; positions are never stored.
#[utoipa::path(
    get,
    path = "/configurations/{name}/layout",
    params(("name" = String, Path, description = "Name of the saved configuration")),
    responses(
        (status = 200, description = "Fresh packing of the stored inputs", body = PackResponse),
        (status = NOT_FOUND, description = "Unknown configuration", body = ErrorResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Stored data no longer passes validation",
            body = ErrorResponse
        )
    ),
    tag = "configurations"
)]
async fn configuration_layout(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Response {
    let config = match with_store(&state, move |store| store.load(&name)).await {
        Ok(config) => config,
        Err(err) => return store_error(err),
    };
    let load = match admit(config.truck, config.cargo, &state.intake_limits()) {
        Ok(load) => load,
        Err(err) => return intake_error(err),
    };

    println!("📥 Re-packing configuration '{}'", config.name);
    let response = pack_load(load, &PositionOverrides::new(), state.packing_config());
    Json(response).into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
