//! Verify request building and result folding against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the expected request, a simulated
//! response, and the value the public operation should return for it.
//! Bodies are compared as parsed JSON, not raw strings, so field order does
//! not matter.

use radius_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, NewUser, RadiusApi, RadiusClient, Record,
    UserQuery, UserUpdate,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000/api";

fn client() -> RadiusClient {
    RadiusClient::new(BASE_URL, "vector-key")
}

/// A `RadiusApi` whose transport always answers with the case's simulated response.
fn scripted(case: &Value) -> RadiusApi<impl Fn(&HttpRequest) -> Result<HttpResponse, ApiError>> {
    let sim = &case["simulated_response"];
    let status = sim["status"].as_u64().unwrap() as u16;
    let body = sim["body"].as_str().unwrap().to_string();
    RadiusApi::with_transport(client(), move |_: &HttpRequest| {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.clone(),
        })
    })
}

fn parse_method(s: &str) -> HttpMethod {
    s.parse().unwrap_or_else(|e| panic!("bad method in vector: {e}"))
}

fn query_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (
                arr[0].as_str().unwrap().to_string(),
                arr[1].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

/// Compare a built request with `expected_request`.
fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(
        req.path,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: path"
    );
    assert_eq!(req.query, query_pairs(&expected["query"]), "{name}: query");
    assert_eq!(
        req.headers,
        vec![
            ("Authorization".to_string(), "Bearer vector-key".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ],
        "{name}: headers"
    );

    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    for case in cases(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: NewUser = serde_json::from_value(case["input"].clone()).unwrap();

        let req = client().build_create_user(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = scripted(&case).create_user(&input);
        assert_eq!(result, case["expected_result"].as_bool().unwrap(), "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    for case in cases(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let query: UserQuery = serde_json::from_value(case["input"].clone()).unwrap();

        let req = client().build_list_users(&query);
        check_request(name, &req, &case["expected_request"]);

        let users = scripted(&case).list_users(&query);
        let expected: Vec<Record> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(users, expected, "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    for case in cases(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let username = case["input_username"].as_str().unwrap();

        let req = client().build_get_user(username);
        check_request(name, &req, &case["expected_request"]);

        let user = scripted(&case).get_user(username);
        let expected: Option<Record> =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(user, expected, "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    for case in cases(include_str!("../../test-vectors/update.json")) {
        let name = case["name"].as_str().unwrap();
        let input: UserUpdate = serde_json::from_value(case["input"].clone()).unwrap();

        let req = client().build_update_user(&input).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = scripted(&case).update_user(&input);
        assert_eq!(result, case["expected_result"].as_bool().unwrap(), "{name}: result");
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    for case in cases(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let username = case["input_username"].as_str().unwrap();

        let req = client().build_delete_user(username);
        check_request(name, &req, &case["expected_request"]);

        let result = scripted(&case).delete_user(username);
        assert_eq!(result, case["expected_result"].as_bool().unwrap(), "{name}: result");
    }
}
