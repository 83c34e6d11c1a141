//! In-process dashboard backend used by integration suites.
//!
//! The stub serves the login endpoints and JSON CRUD collections from memory,
//! counts list requests per collection and can be told to fail the next
//! collection request. Clients answer with bare arrays; every other collection
//! wraps payloads in `{"data": ...}` so both envelopes are exercised.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const CLIENT_EMAIL: &str = "client@example.com";
pub const PASSWORD: &str = "password";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const CLIENT_TOKEN: &str = "tok-client";
pub const PROJECT_ID: &str = "insights-test";

/// Shared in-memory state behind the stub routes.
#[derive(Default)]
pub struct BackendData {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    list_requests: Mutex<HashMap<String, usize>>,
    writes: Mutex<Vec<String>>,
    next_failure: Mutex<Option<(StatusCode, Value)>>,
    project_ids: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl BackendData {
    /// Store `item` (which must carry an `id` or `_id`) in `collection`.
    pub fn seed(&self, collection: &str, item: Value) {
        self.collections
            .lock()
            .expect("collections lock")
            .entry(collection.to_owned())
            .or_default()
            .push(item);
    }

    pub fn items(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .expect("collections lock")
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_requests(&self, collection: &str) -> usize {
        self.list_requests
            .lock()
            .expect("counter lock")
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    /// `METHOD /path` of every write received, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn project_ids(&self) -> Vec<String> {
        self.project_ids.lock().expect("project lock").clone()
    }

    /// Answer the next collection request with `status` and `body`.
    pub fn fail_next(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).expect("valid status");
        *self.next_failure.lock().expect("failure lock") = Some((status, body));
    }

    fn take_failure(&self) -> Option<HttpResponse> {
        self.next_failure
            .lock()
            .expect("failure lock")
            .take()
            .map(|(status, body)| {
                if body.is_null() {
                    HttpResponse::build(status).finish()
                } else {
                    HttpResponse::build(status).json(body)
                }
            })
    }

    fn record_project(&self, req: &HttpRequest) {
        if let Some(value) = req
            .headers()
            .get("x-project-id")
            .and_then(|value| value.to_str().ok())
        {
            self.project_ids
                .lock()
                .expect("project lock")
                .push(value.to_owned());
        }
    }

    fn record_write(&self, req: &HttpRequest) {
        self.writes
            .lock()
            .expect("writes lock")
            .push(format!("{} {}", req.method(), req.path()));
    }
}

fn envelope(collection: &str, payload: Value) -> Value {
    if collection == "clients" {
        payload
    } else {
        json!({ "data": payload })
    }
}

fn authorised(req: &HttpRequest) -> bool {
    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    bearer == format!("Bearer {ADMIN_TOKEN}") || bearer == format!("Bearer {CLIENT_TOKEN}")
}

fn guard(data: &BackendData, req: &HttpRequest) -> Option<HttpResponse> {
    data.record_project(req);
    if !authorised(req) {
        return Some(
            HttpResponse::Unauthorized()
                .json(json!({ "error": { "message": "Authentication required" } })),
        );
    }
    data.take_failure()
}

async fn login(
    data: web::Data<BackendData>,
    req: HttpRequest,
    role: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    data.record_project(&req);
    let role = role.into_inner();
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let account = match (role.as_str(), email) {
        ("admin", ADMIN_EMAIL) => Some((ADMIN_TOKEN, "admin-1", "Ada Admin")),
        ("client", CLIENT_EMAIL) => Some((CLIENT_TOKEN, "client-1", "Cleo Client")),
        _ => None,
    };
    match account {
        Some((token, id, name)) if password == PASSWORD => {
            let payload = json!({
                "token": token,
                "user": { "_id": id, "email": email, "displayName": name, "role": role.as_str() },
            });
            if role == "client" {
                HttpResponse::Ok().json(json!({ "data": payload }))
            } else {
                HttpResponse::Ok().json(payload)
            }
        }
        _ => HttpResponse::Unauthorized().json(json!({ "message": "Invalid email or password" })),
    }
}

/// `id` or `_id` of a stored item.
fn item_id(item: &Value) -> Option<&str> {
    item.get("id")
        .or_else(|| item.get("_id"))
        .and_then(Value::as_str)
}

fn matches_query(item: &Value, query: &HashMap<String, String>) -> bool {
    query.iter().all(|(key, expected)| match item.get(key) {
        Some(Value::String(actual)) => actual == expected,
        Some(Value::Array(values)) => values.iter().any(|value| value == expected.as_str()),
        _ => false,
    })
}

async fn list(
    data: web::Data<BackendData>,
    req: HttpRequest,
    collection: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    let collection = collection.into_inner();
    *data
        .list_requests
        .lock()
        .expect("counter lock")
        .entry(collection.clone())
        .or_default() += 1;
    if let Some(response) = guard(&data, &req) {
        return response;
    }
    let items: Vec<Value> = data
        .items(&collection)
        .into_iter()
        .filter(|item| matches_query(item, &query))
        .collect();
    HttpResponse::Ok().json(envelope(&collection, Value::Array(items)))
}

fn not_found(collection: &str, id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": format!("{collection} {id} not found") }))
}

async fn show(
    data: web::Data<BackendData>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    if let Some(response) = guard(&data, &req) {
        return response;
    }
    let (collection, id) = path.into_inner();
    data.items(&collection)
        .into_iter()
        .find(|item| item_id(item) == Some(id.as_str()))
        .map_or_else(
            || not_found(&collection, &id),
            |item| HttpResponse::Ok().json(envelope(&collection, item)),
        )
}

async fn create(
    data: web::Data<BackendData>,
    req: HttpRequest,
    collection: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Some(response) = guard(&data, &req) {
        return response;
    }
    data.record_write(&req);
    let collection = collection.into_inner();
    let mut item = body.into_inner();
    let id = format!(
        "{}-{}",
        collection.trim_end_matches('s'),
        data.next_id.fetch_add(1, Ordering::SeqCst) + 1
    );
    if let Some(object) = item.as_object_mut() {
        object.insert("_id".to_owned(), Value::String(id));
        object.insert("createdAt".to_owned(), json!("2026-01-05T09:30:00Z"));
    }
    data.seed(&collection, item.clone());
    HttpResponse::Created().json(envelope(&collection, item))
}

async fn update(
    data: web::Data<BackendData>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Some(response) = guard(&data, &req) {
        return response;
    }
    data.record_write(&req);
    let (collection, id) = path.into_inner();
    let mut collections = data.collections.lock().expect("collections lock");
    let Some(slot) = collections.get_mut(&collection).and_then(|items| {
        items
            .iter_mut()
            .find(|item| item_id(item) == Some(id.as_str()))
    }) else {
        return not_found(&collection, &id);
    };
    let mut item = body.into_inner();
    if let Some(object) = item.as_object_mut() {
        object.insert("_id".to_owned(), Value::String(id.clone()));
    }
    *slot = item.clone();
    HttpResponse::Ok().json(envelope(&collection, item))
}

async fn remove(
    data: web::Data<BackendData>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    if let Some(response) = guard(&data, &req) {
        return response;
    }
    data.record_write(&req);
    let (collection, id) = path.into_inner();
    let mut collections = data.collections.lock().expect("collections lock");
    let items = collections.entry(collection.clone()).or_default();
    let before = items.len();
    items.retain(|item| item_id(item) != Some(id.as_str()));
    if items.len() == before {
        return not_found(&collection, &id);
    }
    HttpResponse::NoContent().finish()
}

/// Running stub server.
pub struct StubBackend {
    pub base_url: String,
    pub data: web::Data<BackendData>,
    pub handle: ServerHandle,
}

impl StubBackend {
    /// Bind an ephemeral port and spawn the server on the current local set.
    pub fn start() -> Result<Self, String> {
        let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
        let addr = listener.local_addr().map_err(|err| err.to_string())?;
        let data = web::Data::new(BackendData::default());
        let app_data = data.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_data.clone())
                .route("/api/auth/{role}/login", web::post().to(login))
                .route("/api/{collection}", web::get().to(list))
                .route("/api/{collection}", web::post().to(create))
                .route("/api/{collection}/{id}", web::get().to(show))
                .route("/api/{collection}/{id}", web::put().to(update))
                .route("/api/{collection}/{id}", web::delete().to(remove))
        })
        .disable_signals()
        .workers(1)
        .listen(listener)
        .map_err(|err| err.to_string())?
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(Self {
            base_url: format!("http://{addr}/api"),
            data,
            handle,
        })
    }
}
