//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use kehati_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, KehatiClient, Page, Park, Parks, PlantCollection,
    PlantCollections, ResponseBody, TokenStore, User, Users,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8000";

fn client(token: Option<&str>) -> KehatiClient {
    let tokens = TokenStore::memory_only();
    tokens.set(token.map(str::to_string));
    KehatiClient::new(BASE_URL, tokens)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: vec![(
            "Content-Type".to_string(),
            sim["content_type"].as_str().unwrap().to_string(),
        )],
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => assert_eq!(req.body.as_deref(), body.as_str(), "{name}: body"),
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn check_error(name: &str, err: ApiError, expected: &Value) {
    let (status, body) = match err {
        ApiError::Http { status, body } => (status, body),
        other => panic!("{name}: expected Http error, got {other:?}"),
    };
    assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
    let expected_body = match (expected.get("json"), expected.get("text")) {
        (Some(json), _) => ResponseBody::Json(json.clone()),
        (None, Some(text)) => ResponseBody::Text(text.as_str().unwrap().to_string()),
        _ => panic!("{name}: vector has no expected body"),
    };
    assert_eq!(body, expected_body, "{name}: payload");
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let raw = include_str!("../../test-vectors/list.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client(case["token"].as_str());
        let page = Page::new(
            case["page"]["skip"].as_u64().unwrap() as u32,
            case["page"]["limit"].as_u64().unwrap() as u32,
        );

        // Verify build, then parse
        let (req, result) = match case["resource"].as_str().unwrap() {
            "parks" => {
                let req = c.build_list::<Parks>(page);
                (req, c.parse_list::<Parks>(simulated(case)).map(|v| serde_json::to_value(v).unwrap()))
            }
            "collections" => {
                let req = c.build_list::<PlantCollections>(page);
                let parsed = c.parse_list::<PlantCollections>(simulated(case));
                if let Some(expected) = case.get("expected_result") {
                    let expected: Vec<PlantCollection> = serde_json::from_value(expected.clone()).unwrap();
                    assert_eq!(parsed.as_ref().unwrap(), &expected, "{name}: typed result");
                }
                (req, parsed.map(|v| serde_json::to_value(v).unwrap()))
            }
            "users" => {
                let req = c.build_list::<Users>(page);
                (req, c.parse_list::<Users>(simulated(case)).map(|v| serde_json::to_value::<Vec<User>>(v).unwrap()))
            }
            other => panic!("{name}: unknown resource {other}"),
        };
        check_request(name, &req, &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => check_error(name, result.unwrap_err(), expected),
            None => {
                let len = result.unwrap().as_array().unwrap().len();
                assert_eq!(len, case["expected_result"].as_array().unwrap().len(), "{name}: length");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client(None);

        let req = c.build_login(case["username"].as_str().unwrap(), case["password"].as_str().unwrap());
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_login(simulated(case));
        if let Some(expected) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected);
        } else {
            let login = result.unwrap();
            assert_eq!(Some(login.access_token.as_str()), case["expected_token"].as_str(), "{name}: result");
        }
        assert_eq!(c.tokens().get().as_deref(), case["expected_token"].as_str(), "{name}: stored token");
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    let raw = include_str!("../../test-vectors/get.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(None);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_i64().unwrap();

        let req = c.build_get::<Parks>(&id);
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_get::<Parks>(simulated(case));
        if let Some(expected) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected);
        } else {
            let park = result.unwrap();
            let expected: Park = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(park, expected, "{name}: parsed result");
        }
    }
}
