//! Typed endpoint functions over a `Transport`.
//!
//! `ApiClient` glues the request builder to a transport and groups the
//! endpoints the way the backend does: `auth()`, `users()`, `parks()`,
//! `plant_collections()` and `exports()`. Every call is one build, one
//! round-trip, one parse.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{KehatiClient, RequestBody};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::resource::{ExportFormat, Parks, PlantCollections, Resource, Users};
use crate::token::TokenStore;
use crate::transport::{Transport, UreqTransport};
use crate::types::{LoginResponse, Page, User, UserCreate};

pub struct ApiClient<T> {
    core: KehatiClient,
    transport: T,
}

impl ApiClient<UreqTransport> {
    /// Client for `config.base_url` using the configured token storage. The
    /// token store is initialised here, so a persisted token is picked up
    /// before the first request.
    pub fn from_config(config: &ApiConfig) -> Self {
        let tokens = config.token_store();
        tokens.init();
        Self::new(KehatiClient::new(&config.base_url, tokens), UreqTransport::new())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(core: KehatiClient, transport: T) -> Self {
        Self { core, transport }
    }

    pub fn core(&self) -> &KehatiClient {
        &self.core
    }

    pub fn tokens(&self) -> &TokenStore {
        self.core.tokens()
    }

    /// The request wrapper every endpoint goes through.
    pub fn request<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<R, ApiError> {
        let response = self.transport.execute(self.core.build_request(method, path, body))?;
        self.core.parse_response(response)
    }

    pub fn auth(&self) -> Auth<'_, T> {
        Auth { api: self }
    }

    pub fn users(&self) -> Endpoint<'_, T, Users> {
        Endpoint::new(self)
    }

    pub fn parks(&self) -> Endpoint<'_, T, Parks> {
        Endpoint::new(self)
    }

    pub fn plant_collections(&self) -> Endpoint<'_, T, PlantCollections> {
        Endpoint::new(self)
    }

    pub fn exports(&self) -> Exports<'_, T> {
        Exports { api: self }
    }
}

/// Authentication endpoints.
pub struct Auth<'a, T> {
    api: &'a ApiClient<T>,
}

impl<T: Transport> Auth<'_, T> {
    pub fn register(&self, payload: &UserCreate) -> Result<User, ApiError> {
        let core = &self.api.core;
        core.parse_register(self.api.transport.execute(core.build_register(payload)?)?)
    }

    /// Password-grant login. On success the access token is stored and used
    /// by every later request.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let core = &self.api.core;
        tracing::debug!(username, "logging in");
        core.parse_login(self.api.transport.execute(core.build_login(username, password))?)
    }

    pub fn me(&self) -> Result<User, ApiError> {
        let core = &self.api.core;
        core.parse_me(self.api.transport.execute(core.build_me())?)
    }

    /// Drops the local token; nothing is sent.
    pub fn logout(&self) {
        self.api.core.logout();
    }
}

/// list/get/create/update/delete for one resource.
pub struct Endpoint<'a, T, R> {
    api: &'a ApiClient<T>,
    _resource: PhantomData<R>,
}

impl<'a, T: Transport, R: Resource> Endpoint<'a, T, R> {
    fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    pub fn list(&self, page: Page) -> Result<Vec<R::Record>, ApiError> {
        let core = &self.api.core;
        tracing::debug!(resource = R::NAME, skip = page.skip, limit = page.limit, "listing");
        core.parse_list::<R>(self.api.transport.execute(core.build_list::<R>(page))?)
    }

    pub fn get(&self, id: &R::Id) -> Result<R::Record, ApiError> {
        let core = &self.api.core;
        core.parse_get::<R>(self.api.transport.execute(core.build_get::<R>(id))?)
    }

    pub fn create(&self, payload: &R::Create) -> Result<R::Record, ApiError> {
        let core = &self.api.core;
        core.parse_create::<R>(self.api.transport.execute(core.build_create::<R>(payload)?)?)
    }

    pub fn update(&self, id: &R::Id, payload: &R::Update) -> Result<R::Record, ApiError> {
        let core = &self.api.core;
        core.parse_update::<R>(self.api.transport.execute(core.build_update::<R>(id, payload)?)?)
    }

    pub fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        let core = &self.api.core;
        core.parse_delete(self.api.transport.execute(core.build_delete::<R>(id))?)
    }
}

/// Read-only export endpoints. The payloads are whatever the server emits.
pub struct Exports<'a, T> {
    api: &'a ApiClient<T>,
}

impl<T: Transport> Exports<'_, T> {
    pub fn export(&self, format: ExportFormat, page: Page) -> Result<Value, ApiError> {
        let core = &self.api.core;
        core.parse_export(self.api.transport.execute(core.build_export(format, page))?)
    }

    pub fn darwin_core(&self, page: Page) -> Result<Value, ApiError> {
        self.export(ExportFormat::DarwinCore, page)
    }

    pub fn geojson(&self, page: Page) -> Result<Value, ApiError> {
        self.export(ExportFormat::GeoJson, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResponseBody;
    use crate::http::{HttpRequest, HttpResponse, AUTHORIZATION};
    use crate::token::{MemoryStorage, TokenStorage, TOKEN_KEY};
    use std::sync::Mutex;

    type Canned = fn(&HttpRequest) -> HttpResponse;

    /// Transport that records every request and answers from `respond`.
    fn recording(
        log: &Mutex<Vec<HttpRequest>>,
        respond: Canned,
    ) -> impl Fn(HttpRequest) -> Result<HttpResponse, ApiError> + '_ {
        move |req| {
            let resp = respond(&req);
            log.lock().unwrap().push(req);
            Ok(resp)
        }
    }

    fn api<T: Transport>(transport: T) -> ApiClient<T> {
        ApiClient::new(
            KehatiClient::new("http://backend.test", TokenStore::memory_only()),
            transport,
        )
    }

    fn login_ok(_: &HttpRequest) -> HttpResponse {
        HttpResponse::json(200, r#"{"access_token":"tok-xyz","token_type":"bearer"}"#)
    }

    #[test]
    fn login_then_requests_carry_the_new_token() {
        let log = Mutex::new(Vec::new());
        let api = api(recording(&log, |req| {
            if req.url.ends_with("/api/auth/login") {
                login_ok(req)
            } else {
                HttpResponse::json(200, "[]")
            }
        }));

        api.parks().list(Page::default()).unwrap();
        let login = api.auth().login("admin", "secret").unwrap();
        assert_eq!(login.access_token, "tok-xyz");
        assert_eq!(api.tokens().get().as_deref(), Some("tok-xyz"));
        api.parks().list(Page::default()).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert!(log[0].header(AUTHORIZATION).is_none());
        assert!(log[1].header(AUTHORIZATION).is_none());
        assert_eq!(log[2].header(AUTHORIZATION), Some("Bearer tok-xyz"));
    }

    #[test]
    fn logout_sends_nothing_and_clears_persisted_token() {
        let log = Mutex::new(Vec::new());
        let storage = MemoryStorage::new();
        let tokens = TokenStore::new(storage.clone());
        let api = ApiClient::new(
            KehatiClient::new("http://backend.test", tokens),
            recording(&log, login_ok),
        );

        api.auth().login("admin", "secret").unwrap();
        api.auth().logout();

        assert_eq!(api.tokens().get(), None);
        assert_eq!(storage.load(TOKEN_KEY).unwrap(), None);
        assert_eq!(log.lock().unwrap().len(), 1, "logout must not hit the network");
    }

    #[test]
    fn persisted_token_is_used_after_init_without_login() {
        let storage = MemoryStorage::new();
        TokenStore::new(storage.clone()).set(Some("remembered".to_string()));

        let tokens = TokenStore::new(storage);
        tokens.init();
        let log = Mutex::new(Vec::new());
        let api = ApiClient::new(
            KehatiClient::new("http://backend.test", tokens),
            recording(&log, |_| {
                HttpResponse::json(
                    200,
                    r#"{"id":"u1","username":"admin","email":"a@b.id","role":"admin",
                        "is_active":true,"created_at":"t","updated_at":"t"}"#,
                )
            }),
        );

        let me = api.auth().me().unwrap();
        assert_eq!(me.username, "admin");
        assert_eq!(log.lock().unwrap()[0].header(AUTHORIZATION), Some("Bearer remembered"));
    }

    #[test]
    fn server_rejection_surfaces_status_and_payload() {
        let api = api(|_: HttpRequest| -> Result<HttpResponse, ApiError> {
            Ok(HttpResponse::json(403, r#"{"detail":"Not enough permissions"}"#))
        });
        let err = api.users().list(Page::new(0, 10)).unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(
                    body,
                    ResponseBody::Json(serde_json::json!({"detail": "Not enough permissions"}))
                );
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_propagates_unchanged() {
        let api = api(|_: HttpRequest| -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        });
        let err = api.exports().geojson(Page::default()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m == "connection refused"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn exports_return_untyped_payload() {
        let log = Mutex::new(Vec::new());
        let api = api(recording(&log, |_| {
            HttpResponse::json(200, r#"{"type":"FeatureCollection","features":[]}"#)
        }));
        let fc = api.exports().geojson(Page::new(0, 10)).unwrap();
        assert_eq!(fc["type"], "FeatureCollection");
        api.exports().darwin_core(Page::default()).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log[0].url, "http://backend.test/api/export/geojson?skip=0&limit=10");
        assert_eq!(log[1].url, "http://backend.test/api/export/dwc?skip=0&limit=100");
    }

    #[test]
    fn generic_request_wrapper_defaults_to_json() {
        let log = Mutex::new(Vec::new());
        let api = api(recording(&log, |_| HttpResponse::text(200, "pong")));
        let pong: String = api.request(HttpMethod::Get, "/health", None).unwrap();
        assert_eq!(pong, "pong");
        assert_eq!(log.lock().unwrap()[0].url, "http://backend.test/health");
    }
}
