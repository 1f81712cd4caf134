//! In-memory stand-in for the Taman Kehati backend.
//!
//! Serves the same routes as the real API so the client can be exercised
//! over HTTP. Users are typed; parks and plant collections are stored as
//! JSON documents with their required fields and enums checked on write.
//! Errors use the backend's `{"detail": ...}` shape.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Super admin present in every fresh store.
pub const SEED_USERNAME: &str = "admin";
pub const SEED_PASSWORD: &str = "admin123";

const STATUSES: [&str; 3] = ["draft", "published", "archived"];
const PARK_TYPES: [&str; 3] = ["government", "private", "community"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Viewer,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `Some(None)` when the body carries `"full_name": null`.
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub grant_type: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

struct Account {
    user: User,
    password: String,
}

/// JSON documents keyed by a monotonically assigned id.
#[derive(Default)]
struct Documents {
    next_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

impl Documents {
    fn insert(&mut self, mut doc: Map<String, Value>) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        let now = timestamp();
        doc.insert("id".into(), json!(id));
        doc.entry("status").or_insert_with(|| json!("draft"));
        doc.insert("created_at".into(), json!(now));
        doc.insert("updated_at".into(), json!(now));
        self.rows.insert(id, doc.clone());
        Value::Object(doc)
    }

    fn page(&self, p: &Pagination) -> Vec<Value> {
        self.rows
            .values()
            .skip(p.skip)
            .take(p.limit)
            .cloned()
            .map(Value::Object)
            .collect()
    }
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    parks: Documents,
    collections: Documents,
}

impl Store {
    /// Store holding only the seed super admin.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.add_account(CreateUser {
            username: SEED_USERNAME.to_string(),
            email: "admin@tamankehati.id".to_string(),
            password: SEED_PASSWORD.to_string(),
            full_name: Some("Administrator".to_string()),
            role: Some(Role::SuperAdmin),
            is_active: Some(true),
        });
        store
    }

    fn add_account(&mut self, input: CreateUser) -> User {
        let now = timestamp();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: input.username,
            email: input.email,
            full_name: input.full_name,
            role: input.role.unwrap_or(Role::Viewer),
            is_active: input.is_active.unwrap_or(true),
            created_at: now.clone(),
            updated_at: now,
        };
        self.accounts.insert(
            user.id.clone(),
            Account {
                user: user.clone(),
                password: input.password,
            },
        );
        user
    }

    fn username_taken(&self, username: &str) -> bool {
        self.accounts.values().any(|a| a.user.username == username)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::seeded())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/users/", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/api/taman-kehati/", get(list_parks).post(create_park))
        .route("/api/taman-kehati/{id}", get(get_park).put(update_park).delete(delete_park))
        .route("/api/koleksi-tumbuhan/", get(list_collections).post(create_collection))
        .route(
            "/api/koleksi-tumbuhan/{id}",
            get(get_collection).put(update_collection).delete(delete_collection),
        )
        .route("/api/export/dwc", get(export_dwc))
        .route("/api/export/geojson", get(export_geojson))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Errors and auth
// ---------------------------------------------------------------------------

/// Error response in the backend's `{"detail": ...}` shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": self.detail }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// The account behind the request's bearer token.
pub struct CurrentUser(pub User);

impl CurrentUser {
    fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.0.role) {
            Ok(())
        } else {
            Err(ApiError::new(StatusCode::FORBIDDEN, "Not enough permissions"))
        }
    }
}

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::new(StatusCode::UNAUTHORIZED, "Not authenticated");
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let store = db.read().await;
        let user_id = store.sessions.get(token).ok_or_else(unauthorized)?;
        let account = store.accounts.get(user_id).ok_or_else(unauthorized)?;
        if !account.user.is_active {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "Inactive user"));
        }
        Ok(CurrentUser(account.user.clone()))
    }
}

const EDITORS: [Role; 2] = [Role::SuperAdmin, Role::Admin];

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn register(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let mut store = db.write().await;
    if store.username_taken(&input.username) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    let user = store.add_account(input);
    tracing::info!(username = %user.username, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Result<Json<Value>, ApiError> {
    if form.grant_type.as_deref().is_some_and(|g| g != "password") {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "unsupported grant_type"));
    }
    let mut store = db.write().await;
    let user_id = store
        .accounts
        .values()
        .find(|a| a.user.username == form.username && a.password == form.password)
        .map(|a| a.user.id.clone())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Incorrect username or password"))?;

    let token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(token.clone(), user_id);
    tracing::info!(username = %form.username, "issued access token");
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn list_users(
    State(db): State<Db>,
    caller: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, ApiError> {
    caller.require(&[Role::SuperAdmin])?;
    let store = db.read().await;
    let mut users: Vec<User> = store.accounts.values().map(|a| a.user.clone()).collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.username.cmp(&b.username)));
    Ok(Json(users.into_iter().skip(page.skip).take(page.limit).collect()))
}

async fn create_user(
    State(db): State<Db>,
    caller: CurrentUser,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    caller.require(&[Role::SuperAdmin])?;
    let mut store = db.write().await;
    if store.username_taken(&input.username) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    Ok((StatusCode::CREATED, Json(store.add_account(input))))
}

async fn get_user(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    caller.require(&[Role::SuperAdmin])?;
    let store = db.read().await;
    store
        .accounts
        .get(&id)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(ApiError::not_found)
}

async fn update_user(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    caller.require(&[Role::SuperAdmin])?;
    let mut store = db.write().await;
    let account = store.accounts.get_mut(&id).ok_or_else(ApiError::not_found)?;
    if let Some(username) = input.username {
        account.user.username = username;
    }
    if let Some(email) = input.email {
        account.user.email = email;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    if let Some(full_name) = input.full_name {
        account.user.full_name = full_name;
    }
    if let Some(role) = input.role {
        account.user.role = role;
    }
    if let Some(active) = input.is_active {
        account.user.is_active = active;
    }
    account.user.updated_at = timestamp();
    Ok(Json(account.user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    caller.require(&[Role::SuperAdmin])?;
    let mut store = db.write().await;
    store.accounts.remove(&id).ok_or_else(ApiError::not_found)?;
    store.sessions.retain(|_, user_id| *user_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Parks and plant collections
// ---------------------------------------------------------------------------

/// Reject documents that are not objects, miss `required` fields, or carry
/// out-of-range enum values.
fn validate(doc: &Value, required: &[&str]) -> Result<Map<String, Value>, ApiError> {
    let Value::Object(map) = doc else {
        return Err(ApiError::unprocessable("body must be a JSON object"));
    };
    for field in required {
        if matches!(map.get(*field), None | Some(Value::Null)) {
            return Err(ApiError::unprocessable(format!("field required: {field}")));
        }
    }
    for (field, allowed) in [("status", &STATUSES[..]), ("tipe_taman", &PARK_TYPES[..])] {
        match map.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
            Some(other) => return Err(ApiError::unprocessable(format!("invalid {field}: {other}"))),
        }
    }
    let mut map = map.clone();
    for server_field in ["id", "created_at", "updated_at"] {
        map.remove(server_field);
    }
    Ok(map)
}

fn apply_update(doc: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (k, v) in patch {
        doc.insert(k, v);
    }
    doc.insert("updated_at".into(), json!(timestamp()));
}

async fn list_parks(State(db): State<Db>, Query(page): Query<Pagination>) -> Json<Vec<Value>> {
    Json(db.read().await.parks.page(&page))
}

async fn get_park(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    store
        .parks
        .rows
        .get(&id)
        .map(|doc| Json(Value::Object(doc.clone())))
        .ok_or_else(ApiError::not_found)
}

async fn create_park(
    State(db): State<Db>,
    caller: CurrentUser,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.require(&EDITORS)?;
    let doc = validate(&input, &["nama_resmi"])?;
    let created = db.write().await.parks.insert(doc);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_park(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    caller.require(&EDITORS)?;
    let patch = validate(&input, &[])?;
    let mut store = db.write().await;
    let doc = store.parks.rows.get_mut(&id).ok_or_else(ApiError::not_found)?;
    apply_update(doc, patch);
    Ok(Json(Value::Object(doc.clone())))
}

async fn delete_park(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    caller.require(&EDITORS)?;
    let mut store = db.write().await;
    store.parks.rows.remove(&id).ok_or_else(ApiError::not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_collections(State(db): State<Db>, Query(page): Query<Pagination>) -> Json<Vec<Value>> {
    Json(db.read().await.collections.page(&page))
}

async fn get_collection(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    store
        .collections
        .rows
        .get(&id)
        .map(|doc| Json(Value::Object(doc.clone())))
        .ok_or_else(ApiError::not_found)
}

async fn create_collection(
    State(db): State<Db>,
    caller: CurrentUser,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.require(&EDITORS)?;
    let doc = validate(&input, &["taman_kehati_id", "nama_ilmiah"])?;
    let created = db.write().await.collections.insert(doc);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_collection(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    caller.require(&EDITORS)?;
    let patch = validate(&input, &[])?;
    let mut store = db.write().await;
    let doc = store.collections.rows.get_mut(&id).ok_or_else(ApiError::not_found)?;
    apply_update(doc, patch);
    Ok(Json(Value::Object(doc.clone())))
}

async fn delete_collection(
    State(db): State<Db>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    caller.require(&EDITORS)?;
    let mut store = db.write().await;
    store.collections.rows.remove(&id).ok_or_else(ApiError::not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Darwin Core occurrence records, one per plant collection, located at the
/// owning park.
async fn export_dwc(State(db): State<Db>, Query(page): Query<Pagination>) -> Json<Value> {
    let store = db.read().await;
    let records: Vec<Value> = store
        .collections
        .rows
        .values()
        .skip(page.skip)
        .take(page.limit)
        .map(|c| {
            let park = c
                .get("taman_kehati_id")
                .and_then(Value::as_i64)
                .and_then(|id| store.parks.rows.get(&id));
            let park_field = |name: &str| park.and_then(|p| p.get(name)).cloned().unwrap_or(Value::Null);
            let field = |name: &str| c.get(name).cloned().unwrap_or(Value::Null);
            json!({
                "occurrenceID": format!("koleksi-{}", field("id")),
                "basisOfRecord": "PreservedSpecimen",
                "scientificName": field("nama_ilmiah"),
                "scientificNameAuthorship": field("author"),
                "family": field("familia"),
                "genus": field("genus"),
                "specificEpithet": field("spesies"),
                "infraspecificEpithet": field("varietas"),
                "vernacularName": field("nama_umum_nasional"),
                "recordNumber": field("nomor_koleksi"),
                "eventDate": field("tanggal_koleksi"),
                "locality": field("lokasi_koleksi"),
                "habitat": field("habitat"),
                "decimalLatitude": park_field("latitude"),
                "decimalLongitude": park_field("longitude"),
            })
        })
        .collect();
    Json(json!({ "count": records.len(), "records": records }))
}

/// Parks with coordinates as a GeoJSON FeatureCollection.
async fn export_geojson(State(db): State<Db>, Query(page): Query<Pagination>) -> Json<Value> {
    let store = db.read().await;
    let features: Vec<Value> = store
        .parks
        .rows
        .values()
        .skip(page.skip)
        .take(page.limit)
        .filter_map(|p| {
            let lat = p.get("latitude").and_then(Value::as_f64)?;
            let lon = p.get("longitude").and_then(Value::as_f64)?;
            Some(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [lon, lat] },
                "properties": {
                    "id": p.get("id"),
                    "nama_resmi": p.get("nama_resmi"),
                    "tipe_taman": p.get("tipe_taman"),
                    "status": p.get("status"),
                },
            }))
        })
        .collect();
    Json(json!({ "type": "FeatureCollection", "features": features }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_role_in_snake_case() {
        let store = Store::seeded();
        let admin = store.accounts.values().next().unwrap();
        let json = serde_json::to_value(&admin.user).unwrap();
        assert_eq!(json["role"], "super_admin");
        assert_eq!(json["username"], SEED_USERNAME);
    }

    #[test]
    fn create_user_defaults_to_active_viewer() {
        let mut store = Store::default();
        let input: CreateUser =
            serde_json::from_str(r#"{"username":"rina","email":"rina@kehati.id","password":"pw"}"#).unwrap();
        let user = store.add_account(input);
        assert_eq!(user.role, Role::Viewer);
        assert!(user.is_active);
    }

    #[test]
    fn pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn documents_get_server_fields() {
        let mut docs = Documents::default();
        let created = docs.insert(validate(&json!({"nama_resmi": "Taman A"}), &["nama_resmi"]).unwrap());
        assert_eq!(created["id"], 1);
        assert_eq!(created["status"], "draft");
        assert!(created["created_at"].is_string());
    }

    #[test]
    fn validate_rejects_missing_required_field() {
        let err = validate(&json!({"alamat": "Jl. Raya"}), &["nama_resmi"]).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn validate_rejects_unknown_status() {
        let err = validate(&json!({"nama_resmi": "A", "status": "deleted"}), &["nama_resmi"]).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn validate_strips_server_owned_fields() {
        let doc = validate(&json!({"nama_resmi": "A", "id": 99, "created_at": "x"}), &[]).unwrap();
        assert!(!doc.contains_key("id"));
        assert!(!doc.contains_key("created_at"));
    }
}
