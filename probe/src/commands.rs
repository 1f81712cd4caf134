//! Runs one probe command against an `ApiClient`.

use kehati_core::{ApiClient, ApiError, Page, Transport};
use serde_json::{json, Value};

use crate::args::Command;

/// Execute `command` and return its result as JSON for display.
pub fn execute<T: Transport>(api: &ApiClient<T>, command: &Command) -> Result<Value, ApiError> {
    match command {
        Command::Login { username, password } => {
            let login = api.auth().login(username, password)?;
            let me = api.auth().me()?;
            Ok(json!({ "login": login, "me": me }))
        }
        Command::Me => Ok(json!(api.auth().me()?)),
        Command::Logout => {
            api.auth().logout();
            Ok(json!({ "logged_out": true }))
        }
        Command::Parks(page) => Ok(json!(api.parks().list((*page).into())?)),
        Command::Collections(page) => Ok(json!(api.plant_collections().list((*page).into())?)),
        Command::Users(page) => Ok(json!(api.users().list((*page).into())?)),
        Command::Export { format, page } => api.exports().export((*format).into(), (*page).into()),
        Command::Flow { username, password } => flow(api, username, password),
    }
}

fn flow<T: Transport>(api: &ApiClient<T>, username: &str, password: &str) -> Result<Value, ApiError> {
    tracing::info!("step 1: login");
    let login = api.auth().login(username, password)?;

    tracing::info!("step 2: get current user");
    let me = api.auth().me()?;
    tracing::info!(username = %me.username, "logged in");

    tracing::info!("step 3: list taman kehati");
    let parks = api.parks().list(Page::new(0, 5))?;
    tracing::info!(count = parks.len(), "parks found");

    tracing::info!("step 4: list koleksi tumbuhan");
    let plants = api.plant_collections().list(Page::new(0, 5))?;
    tracing::info!(count = plants.len(), "plants found");

    Ok(json!({ "login": login, "me": me, "parks": parks, "plants": plants }))
}

/// Failure text: `HTTP <status>: <payload>` for server rejections, the
/// error message otherwise.
pub fn describe_failure(err: &ApiError) -> String {
    match err {
        ApiError::Http { status, body } => {
            let payload = match body.as_json() {
                Some(json) => serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string()),
                None => body.to_string(),
            };
            format!("HTTP {status}: {payload}")
        }
        other => other.to_string(),
    }
}
