//! HTTP request builder and response parser for the Taman Kehati API.
//!
//! # Design
//! `KehatiClient` holds the base URL and a handle to the `TokenStore`. Each
//! endpoint is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`; the caller runs
//! the round-trip in between. All requests go through `build_request`, and
//! all responses through `parse_response`, so header construction and error
//! normalization live in exactly one place each.
//!
//! The token store is read while building and written only by
//! `parse_login` and `logout`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::{ApiError, ResponseBody};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, AUTHORIZATION, CACHE_CONTROL,
    CONTENT_TYPE, FORM_URLENCODED,
};
use crate::resource::{ExportFormat, Resource};
use crate::token::TokenStore;
use crate::types::{LoginResponse, Page, User, UserCreate};

const REGISTER_PATH: &str = "/api/auth/register";
const LOGIN_PATH: &str = "/api/auth/login";
const ME_PATH: &str = "/api/auth/me";

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Already JSON-encoded.
    Json(String),
    /// Already form-encoded. Only the login grant sends one.
    Form(String),
}

/// Synchronous request builder and response parser bound to one backend.
#[derive(Debug, Clone)]
pub struct KehatiClient {
    base_url: String,
    tokens: TokenStore,
}

impl KehatiClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Core request / response handling
    // -----------------------------------------------------------------------

    /// Build a request for `path` relative to the base URL.
    ///
    /// Content type is JSON unless a form body is given. The bearer header is
    /// attached only when the token store holds a credential. Caching is
    /// always disabled.
    pub fn build_request(&self, method: HttpMethod, path: &str, body: Option<RequestBody>) -> HttpRequest {
        let mut headers = Vec::with_capacity(3);
        let content_type = match body {
            Some(RequestBody::Form(_)) => FORM_URLENCODED,
            _ => APPLICATION_JSON,
        };
        headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
        if let Some(token) = self.tokens.get() {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        headers.push((CACHE_CONTROL.to_string(), "no-store".to_string()));

        let body = body.map(|b| match b {
            RequestBody::Json(s) | RequestBody::Form(s) => s,
        });

        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    /// Build a request whose body is `payload` encoded as JSON.
    pub fn build_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.build_request(method, path, Some(RequestBody::Json(body))))
    }

    /// Decode a response: the declared content type picks JSON or raw text,
    /// a 2xx status yields the body as `T`, anything else an `ApiError::Http`.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        if response.is_json() {
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            serde_json::from_value(Value::String(response.body))
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        }
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub fn build_register(&self, payload: &UserCreate) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, REGISTER_PATH, payload)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<User, ApiError> {
        self.parse_response(response)
    }

    /// OAuth2 password grant, sent as a form.
    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .append_pair("grant_type", "password")
            .finish();
        self.build_request(HttpMethod::Post, LOGIN_PATH, Some(RequestBody::Form(form)))
    }

    /// Parse the login result and store its access token as-is.
    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        let login: LoginResponse = self.parse_response(response)?;
        self.tokens.set(Some(login.access_token.clone()));
        tracing::debug!("login succeeded; access token stored");
        Ok(login)
    }

    pub fn build_me(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, ME_PATH, None)
    }

    pub fn parse_me(&self, response: HttpResponse) -> Result<User, ApiError> {
        self.parse_response(response)
    }

    /// Forget the credential. Purely local; the backend is not told.
    pub fn logout(&self) {
        self.tokens.clear();
    }

    // -----------------------------------------------------------------------
    // CRUD resources
    // -----------------------------------------------------------------------

    pub fn build_list<R: Resource>(&self, page: Page) -> HttpRequest {
        self.build_request(HttpMethod::Get, &format!("{}/{}", R::PATH, page.query()), None)
    }

    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R::Record>, ApiError> {
        self.parse_response(response)
    }

    pub fn build_get<R: Resource>(&self, id: &R::Id) -> HttpRequest {
        self.build_request(HttpMethod::Get, &format!("{}/{id}", R::PATH), None)
    }

    pub fn parse_get<R: Resource>(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        self.parse_response(response)
    }

    pub fn build_create<R: Resource>(&self, payload: &R::Create) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, &format!("{}/", R::PATH), payload)
    }

    pub fn parse_create<R: Resource>(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        self.parse_response(response)
    }

    pub fn build_update<R: Resource>(&self, id: &R::Id, payload: &R::Update) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Put, &format!("{}/{id}", R::PATH), payload)
    }

    pub fn parse_update<R: Resource>(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        self.parse_response(response)
    }

    pub fn build_delete<R: Resource>(&self, id: &R::Id) -> HttpRequest {
        self.build_request(HttpMethod::Delete, &format!("{}/{id}", R::PATH), None)
    }

    /// Whatever body accompanies a successful delete is ignored.
    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    pub fn build_export(&self, format: ExportFormat, page: Page) -> HttpRequest {
        self.build_request(HttpMethod::Get, &format!("{}{}", format.path(), page.query()), None)
    }

    /// The export payload shape belongs to the server; it is returned untyped.
    pub fn parse_export(&self, response: HttpResponse) -> Result<Value, ApiError> {
        self.parse_response(response)
    }
}

/// Map a non-2xx response to `ApiError::Http` with its decoded body.
///
/// A body declared as JSON that fails to parse is kept as text so the status
/// is never lost.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = if response.is_json() {
        serde_json::from_str(&response.body)
            .map(ResponseBody::Json)
            .unwrap_or_else(|_| ResponseBody::Text(response.body.clone()))
    } else {
        ResponseBody::Text(response.body.clone())
    };
    Err(ApiError::Http {
        status: response.status,
        body,
    })
}
