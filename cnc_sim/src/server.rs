//! axum front-end of the simulator.
//!
//! Routes mirror the external admin API one-to-one. Every request passes
//! through `gatekeeper`, which logs it, applies injected latency and faults,
//! then checks the token when one is required.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use cnc_common::{
    AdminUser, Bit, EntityId, FaqVideo, IssueReport, Machine, Material, NewsletterSignup, RemoveAdminRequest,
    SetAdminRequest, Setting, ShareSettingsRequest, Spindle, SpindleSettingsResponse, User,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::store::{RecordedRequest, SimResource, SimState, StoreError, Submission};

/// Shared handle on the simulator state. Cheap to clone.
#[derive(Clone)]
pub struct Sim {
    state: Arc<Mutex<SimState>>,
}

impl Sim {
    pub fn new(state: SimState) -> Self {
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Run `f` with exclusive access to the state.
    pub async fn with<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests().to_vec()
    }

    /// Number of recorded requests whose path starts with `prefix`.
    pub async fn count_requests(&self, method: &str, prefix: &str) -> usize {
        self.state
            .lock()
            .await
            .requests()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }
}

/// Error response: status plus a JSON `{"message": ...}` body.
#[derive(Debug)]
struct SimError {
    status: StatusCode,
    message: String,
}

impl SimError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<StoreError> for SimError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type SimResult<T> = Result<T, SimError>;

/// Same as `SimError` with a plain-text body. The CSV import and the cascade
/// delete answer this way.
#[derive(Debug)]
struct TextError(SimError);

impl From<SimError> for TextError {
    fn from(err: SimError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for TextError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for TextError {
    fn into_response(self) -> Response {
        (self.0.status, self.0.message).into_response()
    }
}

/// Build the full router over `sim`.
pub fn router(sim: Sim) -> Router {
    Router::new()
        .merge(resource_routes::<Machine>())
        .merge(resource_routes::<Spindle>())
        .merge(resource_routes::<Material>())
        .merge(resource_routes::<Bit>())
        .merge(resource_routes::<Setting>())
        .route("/admin/cnc/settings/spindle/:id", get(settings_for_spindle))
        .route("/admin/cnc/settings/upload", post(upload_settings))
        .route("/admin/cnc/settings/delete/spindle/:id", delete(delete_spindle))
        .route("/admin/admins", get(list_admins))
        .route("/admin/set-admin", post(set_admin))
        .route("/admin/remove-admin", post(remove_admin))
        .route("/api/users", get(list_users))
        .route("/videos/faq", get(faq_video))
        .route("/newsletter", post(newsletter))
        .route("/report", post(report))
        .route("/cnc/share-settings", post(share_settings))
        .route("/cnc/reset-preference", delete(reset_preference))
        .layer(middleware::from_fn_with_state(sim.clone(), gatekeeper))
        .with_state(sim)
}

fn resource_routes<R: SimResource>() -> Router<Sim> {
    let collection = format!("/admin/cnc/{}", R::COLLECTION);
    let item = format!("{}/:id", collection);
    Router::new()
        .route(&collection, get(list::<R>).post(create::<R>))
        .route(&item, get(fetch::<R>).put(update::<R>).delete(remove::<R>))
}

/// Bind `127.0.0.1:0`, serve in the background and return the base URL.
pub async fn spawn(state: SimState) -> std::io::Result<(String, Sim)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let sim = Sim::new(state);
    let app = router(sim.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Simulator stopped: {}", e);
        }
    });
    Ok((format!("http://{}", addr), sim))
}

/// Serve on `addr` until the process exits.
pub async fn serve(addr: SocketAddr, state: SimState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Admin API simulator listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(Sim::new(state))).await
}

// ========== Middleware ==========

async fn gatekeeper(State(sim): State<Sim>, request: Request<Body>, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    debug!("{} {}", method, path);

    let (fault, latency, token) = {
        let mut state = sim.state.lock().await;
        state.record(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
        });
        (
            state.take_fault(&method, &path),
            state.latency(),
            state.token().map(str::to_string),
        )
    };

    if let Some(delay) = latency {
        tokio::time::sleep(delay).await;
    }

    if let Some(fault) = fault {
        let status = StatusCode::from_u16(fault.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, fault.body).into_response();
    }

    if let Some(token) = token {
        // Admin routes take the raw token, public routes a Bearer token
        let expected = if path == "/newsletter" || path == "/videos/faq" {
            None
        } else if path == "/report" || path.starts_with("/cnc/") {
            Some(format!("Bearer {}", token))
        } else {
            Some(token)
        };
        if let Some(expected) = expected {
            if authorization.as_deref() != Some(expected.as_str()) {
                return SimError { status: StatusCode::UNAUTHORIZED, message: "Unauthorized".to_string() }
                    .into_response();
            }
        }
    }

    next.run(request).await
}

// ========== Generic collection handlers ==========

async fn list<R: SimResource>(State(sim): State<Sim>) -> Json<Vec<R>> {
    Json(sim.with(|s| s.list::<R>()).await)
}

async fn fetch<R: SimResource>(State(sim): State<Sim>, Path(id): Path<EntityId>) -> SimResult<Json<R>> {
    sim.with(|s| s.get::<R>(id))
        .await
        .map(Json)
        .ok_or_else(|| SimError { status: StatusCode::NOT_FOUND, message: format!("{} not found", R::LABEL) })
}

async fn create<R: SimResource>(
    State(sim): State<Sim>,
    Json(payload): Json<R::Payload>,
) -> SimResult<(StatusCode, Json<R>)> {
    let record = sim.with(|s| s.create::<R>(payload)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update<R: SimResource>(
    State(sim): State<Sim>,
    Path(id): Path<EntityId>,
    Json(payload): Json<R::Payload>,
) -> SimResult<Json<R>> {
    Ok(Json(sim.with(|s| s.update::<R>(id, payload)).await?))
}

async fn remove<R: SimResource>(State(sim): State<Sim>, Path(id): Path<EntityId>) -> SimResult<Json<Value>> {
    sim.with(|s| s.delete::<R>(id)).await?;
    Ok(Json(json!({ "message": format!("{} deleted", R::LABEL) })))
}

// ========== Settings ==========

async fn settings_for_spindle(State(sim): State<Sim>, Path(id): Path<EntityId>) -> Json<SpindleSettingsResponse> {
    let settings = sim.with(|s| s.settings_for_spindle(id)).await;
    Json(SpindleSettingsResponse { settings })
}

async fn upload_settings(
    State(sim): State<Sim>,
    mut multipart: Multipart,
) -> Result<Json<Value>, TextError> {
    let mut file = None;
    let mut spindle_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SimError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file = Some(field.bytes().await.map_err(|e| SimError::bad_request(e.to_string()))?);
            }
            "spindle_id" => {
                let text = field.text().await.map_err(|e| SimError::bad_request(e.to_string()))?;
                spindle_id = Some(
                    text.trim()
                        .parse::<EntityId>()
                        .map_err(|_| SimError::bad_request("Invalid spindle_id"))?,
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| SimError::bad_request("No file uploaded"))?;
    let spindle_id = spindle_id.ok_or_else(|| SimError::bad_request("Missing spindle_id"))?;
    let count = sim.with(|s| s.import_settings_csv(spindle_id, &file)).await?;
    info!("Imported {} settings for spindle {}", count, spindle_id);
    Ok(Json(json!({ "message": format!("Imported {} settings", count), "count": count })))
}

async fn delete_spindle(
    State(sim): State<Sim>,
    Path(id): Path<EntityId>,
) -> Result<Json<Value>, TextError> {
    let removed = sim.with(|s| s.delete_spindle_cascade(id)).await?;
    info!("Deleted spindle {} and {} settings", id, removed);
    Ok(Json(json!({ "message": "Spindle and its settings deleted", "deleted": removed })))
}

// ========== Accounts ==========

async fn list_admins(State(sim): State<Sim>) -> Json<Vec<AdminUser>> {
    Json(sim.with(|s| s.admins()).await)
}

async fn set_admin(State(sim): State<Sim>, Json(req): Json<SetAdminRequest>) -> SimResult<Json<Value>> {
    sim.with(|s| s.set_admin(&req.email, req.is_admin)).await?;
    Ok(Json(json!({ "message": "User role updated" })))
}

async fn remove_admin(State(sim): State<Sim>, Json(req): Json<RemoveAdminRequest>) -> SimResult<Json<Value>> {
    sim.with(|s| s.set_admin(&req.email, false)).await?;
    Ok(Json(json!({ "message": "Admin removed" })))
}

async fn list_users(State(sim): State<Sim>) -> Json<Vec<User>> {
    Json(sim.with(|s| s.users.clone()).await)
}

// ========== Public site ==========

async fn record_submission<T: Serialize>(sim: &Sim, endpoint: &str, body: &T) {
    let body = serde_json::to_value(body).unwrap_or_default();
    let endpoint = endpoint.to_string();
    sim.with(|s| s.submissions.push(Submission { endpoint, body })).await;
}

async fn faq_video(State(sim): State<Sim>) -> SimResult<Json<FaqVideo>> {
    sim.with(|s| s.faq_video.clone())
        .await
        .map(Json)
        .ok_or_else(|| SimError { status: StatusCode::NOT_FOUND, message: "Video not found".to_string() })
}

async fn newsletter(State(sim): State<Sim>, Json(req): Json<NewsletterSignup>) -> Json<Value> {
    record_submission(&sim, "/newsletter", &req).await;
    Json(json!({ "message": "Subscribed" }))
}

async fn report(State(sim): State<Sim>, Json(req): Json<IssueReport>) -> Json<Value> {
    record_submission(&sim, "/report", &req).await;
    Json(json!({ "message": "Report submitted" }))
}

async fn share_settings(State(sim): State<Sim>, Json(req): Json<ShareSettingsRequest>) -> Json<Value> {
    record_submission(&sim, "/cnc/share-settings", &req).await;
    Json(json!({ "message": "Settings shared" }))
}

async fn reset_preference(State(sim): State<Sim>) -> Json<Value> {
    record_submission(&sim, "/cnc/reset-preference", &Value::Null).await;
    Json(json!({ "message": "Preference reset" }))
}
