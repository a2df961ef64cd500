//! The walk-through against a scripted transport that records every request.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use radius_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, RadiusApi, RadiusClient};
use radius_demo::{run, DemoOptions};
use serde_json::{json, Value};

fn respond(body: Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

/// Canned answers keyed by method and endpoint, as a healthy server would give.
fn healthy_server(req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    let endpoint = req.path.rsplit('/').next().unwrap_or("");
    match (req.method, endpoint) {
        (HttpMethod::Post, "login") => respond(json!({ "success": true, "data": { "token": "k" } })),
        (HttpMethod::Get, "stats") => respond(json!({
            "success": true,
            "data": { "total_users": "12", "active_sessions": 3 }
        })),
        (HttpMethod::Get, "users") => respond(json!({
            "success": true,
            "data": { "users": [{ "username": "cliente1@fibra" }, { "username": "other" }] }
        })),
        (HttpMethod::Get, "user") => respond(json!({
            "success": true,
            "data": { "check": [{ "attribute": "Cleartext-Password" }], "reply": [] }
        })),
        _ => respond(json!({ "success": true, "message": "ok" })),
    }
}

/// One buffer shared by the demo output and the api notices.
#[derive(Clone, Default)]
struct Transcript(Rc<RefCell<Vec<u8>>>);

impl Transcript {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Transcript {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn summary(req: &HttpRequest) -> String {
    let endpoint = req.path.rsplit('/').next().unwrap_or("");
    format!("{} {endpoint}", req.method)
}

#[test]
fn aborts_after_failed_connectivity_check() {
    let calls = RefCell::new(Vec::new());
    let transport = |req: &HttpRequest| {
        calls.borrow_mut().push(summary(req));
        respond(json!({ "success": false, "message": "invalid credentials" }))
    };
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api", "bad"), transport);

    let mut out: Vec<u8> = Vec::new();
    let completed = run(&api, &DemoOptions::default(), &mut out).unwrap();

    assert!(!completed);
    assert_eq!(*calls.borrow(), vec!["POST login".to_string()]);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Could not connect"));
    assert!(!text.contains("Statistics"));
}

#[test]
fn runs_every_step_in_order() {
    let calls = RefCell::new(Vec::new());
    let transport = |req: &HttpRequest| {
        calls.borrow_mut().push(summary(req));
        healthy_server(req)
    };
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api/", "k"), transport);

    let mut out: Vec<u8> = Vec::new();
    assert!(run(&api, &DemoOptions::default(), &mut out).unwrap());

    assert_eq!(
        *calls.borrow(),
        vec![
            "POST login",
            "GET stats",
            "POST users",
            "GET users",
            "GET users",
            "GET user",
            "PUT user",
        ]
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Total users: 12"));
    assert!(text.contains("Active sessions: 3"));
    assert!(text.contains("   - other"));
    assert!(text.contains("Found: cliente1@fibra"));
    assert!(text.contains("User found with 1 attributes"));
    assert!(text.ends_with("Examples completed!\n"));
}

#[test]
fn list_and_search_requests_carry_expected_params() {
    let requests = RefCell::new(Vec::new());
    let transport = |req: &HttpRequest| {
        requests.borrow_mut().push(req.clone());
        healthy_server(req)
    };
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api", "k"), transport);
    run(&api, &DemoOptions::default(), &mut Vec::<u8>::new()).unwrap();

    let requests = requests.borrow();
    let lists: Vec<&HttpRequest> = requests
        .iter()
        .filter(|r| r.path == "http://host/api/users" && r.method == HttpMethod::Get)
        .collect();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].query_param("limit"), Some("10"));
    assert_eq!(lists[0].query_param("search"), None);
    assert_eq!(lists[1].query_param("search"), Some("cliente1"));

    let update = requests.iter().find(|r| r.method == HttpMethod::Put).unwrap();
    let body: Value = serde_json::from_str(update.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({ "username": "cliente1@fibra", "bandwidth_up": "100M", "bandwidth_down": "100M" })
    );
}

#[test]
fn delete_runs_only_when_requested() {
    let calls = RefCell::new(Vec::new());
    let transport = |req: &HttpRequest| {
        calls.borrow_mut().push(summary(req));
        healthy_server(req)
    };
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api", "k"), transport);

    let options = DemoOptions {
        delete_sample: true,
    };
    assert!(run(&api, &options, &mut Vec::<u8>::new()).unwrap());
    assert_eq!(calls.borrow().last().unwrap(), "DELETE user");
}

#[test]
fn transcript_includes_mutation_notices_in_order() {
    let transcript = Transcript::default();
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api", "k"), healthy_server)
        .with_notices(transcript.clone());

    let options = DemoOptions {
        delete_sample: true,
    };
    assert!(run(&api, &options, &mut transcript.clone()).unwrap());

    let text = transcript.text();
    let created = text.find("➕ Creating sample user...\n✅ User 'cliente1@fibra' created\n");
    let updated = text.find("✏️ Updating user bandwidth...\n✅ User 'cliente1@fibra' updated\n");
    let deleted = text.find("🗑️ Deleting sample user...\n✅ User 'cliente1@fibra' deleted\n");
    assert!(created.is_some(), "create notice missing from transcript:\n{text}");
    assert!(created < updated && updated < deleted, "notices out of order:\n{text}");
}

#[test]
fn transcript_includes_server_rejection_reason() {
    let transport = |req: &HttpRequest| match (req.method, req.path.rsplit('/').next()) {
        (HttpMethod::Post, Some("users")) => {
            respond(json!({ "success": false, "message": "User already exists" }))
        }
        _ => healthy_server(req),
    };
    let transcript = Transcript::default();
    let api = RadiusApi::with_transport(RadiusClient::new("http://host/api", "k"), transport)
        .with_notices(transcript.clone());

    assert!(run(&api, &DemoOptions::default(), &mut transcript.clone()).unwrap());

    let text = transcript.text();
    assert!(text.contains("➕ Creating sample user...\n❌ Failed to create user: User already exists\n"));
    assert!(text.contains("✅ User 'cliente1@fibra' updated\n"));
}
