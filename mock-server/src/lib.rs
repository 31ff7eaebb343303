use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const REALM: &str = "fixtures";

/// `Basic base64("admin:secret")`
const BASIC_TOKEN: &str = "Basic YWRtaW46c2VjcmV0";
const SESSION_COOKIE: &str = "session";
const EXPIRED: &str = "expires=Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub department: String,
}

#[derive(Deserialize)]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Default)]
struct Store {
    employees: Vec<Employee>,
    sessions: HashMap<String, String>,
}

type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(index))
        .route("/cookies", get(show_cookies))
        .route("/cookies/set", get(set_cookies))
        .route("/cookies/delete", get(delete_cookies))
        .route("/redirect/{hops}", get(redirect))
        .route("/see-other", get(see_other))
        .route("/protected", get(protected))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/account", get(account))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/{id}", get(get_employee).delete(delete_employee))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Pages and cookies
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html("<html><head><title>Fixtures</title></head><body><h1>Welcome</h1></body></html>")
}

/// Echo the `Cookie` header back as the body.
async fn show_cookies(headers: HeaderMap) -> String {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ")
}

/// `/cookies/set?a=1&b=2` sets one cookie per query pair.
async fn set_cookies(Query(pairs): Query<BTreeMap<String, String>>) -> impl IntoResponse {
    let cookies = pairs
        .into_iter()
        .map(|(name, value)| (header::SET_COOKIE, format!("{name}={value}; path=/")));
    (AppendHeaders(cookies), "Cookies set")
}

/// `/cookies/delete?a` expires cookie `a`.
async fn delete_cookies(Query(pairs): Query<BTreeMap<String, String>>) -> impl IntoResponse {
    let cookies = pairs
        .into_keys()
        .map(|name| (header::SET_COOKIE, format!("{name}=; path=/; {EXPIRED}")));
    (AppendHeaders(cookies), "Cookies deleted")
}

// ---------------------------------------------------------------------------
// Redirects and authentication
// ---------------------------------------------------------------------------

/// `302` chain that ends after `hops` redirects.
async fn redirect(Path(hops): Path<u32>) -> Response {
    if hops == 0 {
        return Html("<p>Redirect done</p>").into_response();
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/redirect/{}", hops - 1))],
    )
        .into_response()
}

async fn see_other() -> Redirect {
    Redirect::to("/")
}

async fn protected(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == BASIC_TOKEN);
    if authorized {
        return Html("<p>Access granted</p>").into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
        "Authorization required",
    )
        .into_response()
}

async fn login(State(db): State<Db>, Form(input): Form<Login>) -> Response {
    if input.username != USERNAME || input.password != PASSWORD {
        tracing::debug!(username = %input.username, "login rejected");
        return Html("<p>Invalid credentials</p>").into_response();
    }
    let session = Uuid::new_v4().to_string();
    db.write()
        .await
        .sessions
        .insert(session.clone(), input.username);
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/account".to_string()),
            (header::SET_COOKIE, format!("{SESSION_COOKIE}={session}; path=/")),
        ],
    )
        .into_response()
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Some(session) = cookie_value(&headers, SESSION_COOKIE) {
        db.write().await.sessions.remove(&session);
    }
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, format!("{SESSION_COOKIE}=; path=/; {EXPIRED}")),
        ],
    )
        .into_response()
}

async fn account(State(db): State<Db>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    let user = cookie_value(&headers, SESSION_COOKIE).and_then(|s| store.sessions.get(&s));
    match user {
        Some(user) => Html(format!("<p>Signed in as {user}</p>")).into_response(),
        None => (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response(),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

async fn list_employees(State(db): State<Db>) -> Json<Vec<Employee>> {
    Json(db.read().await.employees.clone())
}

/// Form post answered with `303` to the new record.
async fn create_employee(State(db): State<Db>, Form(input): Form<NewEmployee>) -> Response {
    let employee = Employee {
        id: Uuid::new_v4(),
        name: input.name,
        department: input.department,
    };
    let location = format!("/employees/{}", employee.id);
    db.write().await.employees.push(employee);
    (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
}

async fn get_employee(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, StatusCode> {
    let store = db.read().await;
    store
        .employees
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_employee(State(db): State<Db>, Path(id): Path<Uuid>) -> StatusCode {
    let mut store = db.write().await;
    let before = store.employees.len();
    store.employees.retain(|e| e.id != id);
    if store.employees.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
