use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Employee};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body.to_string())
        .unwrap()
}

fn header<'a>(resp: &'a axum::response::Response, name: http::HeaderName) -> Vec<&'a str> {
    resp.headers()
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect()
}

// --- pages and cookies ---

#[tokio::test]
async fn index_is_html() {
    let resp = app().oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, http::header::CONTENT_TYPE)[0].starts_with("text/html"));
    let body = body_bytes(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Welcome"));
}

#[tokio::test]
async fn set_cookies_emits_one_header_per_pair() {
    let resp = app().oneshot(get("/cookies/set?b=2&a=1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header(&resp, http::header::SET_COOKIE),
        vec!["a=1; path=/", "b=2; path=/"]
    );
}

#[tokio::test]
async fn delete_cookies_expires_them() {
    let resp = app().oneshot(get("/cookies/delete?a")).await.unwrap();
    let cookies = header(&resp, http::header::SET_COOKIE);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("a=; path=/; expires=Thu, 01 Jan 1970"));
}

#[tokio::test]
async fn cookies_are_echoed() {
    let req = Request::builder()
        .uri("/cookies")
        .header(http::header::COOKIE, "a=1;b=2")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(body_bytes(resp).await, "a=1;b=2");
}

// --- redirects and auth ---

#[tokio::test]
async fn redirect_chain_counts_down() {
    let resp = app().oneshot(get("/redirect/2")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(header(&resp, http::header::LOCATION), vec!["/redirect/1"]);

    let resp = app().oneshot(get("/redirect/0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn see_other_points_home() {
    let resp = app().oneshot(get("/see-other")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&resp, http::header::LOCATION), vec!["/"]);
}

#[tokio::test]
async fn protected_challenges_without_credentials() {
    let resp = app().oneshot(get("/protected")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        header(&resp, http::header::WWW_AUTHENTICATE),
        vec!["Basic realm=\"fixtures\""]
    );
}

#[tokio::test]
async fn protected_accepts_basic_credentials() {
    let req = Request::builder()
        .uri("/protected")
        .header(http::header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_login_stays_on_page() {
    let resp = app()
        .oneshot(form_request("/login", "username=admin&password=nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, http::header::SET_COOKIE).is_empty());
}

#[tokio::test]
async fn account_without_session_redirects_home() {
    let resp = app().oneshot(get("/account")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn login_session_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request("/login", "username=admin&password=secret"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&resp, http::header::LOCATION), vec!["/account"]);
    let set_cookie = header(&resp, http::header::SET_COOKIE)[0].to_string();
    let session = set_cookie.split(';').next().unwrap().to_string();
    assert!(session.starts_with("session="));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/account")
                .header(http::header::COOKIE, &session)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Signed in as admin"));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(http::header::COOKIE, &session)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // session is gone server side
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/account")
                .header(http::header::COOKIE, &session)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
}

// --- employees ---

#[tokio::test]
async fn unknown_employee_is_404() {
    let resp = app()
        .oneshot(get("/employees/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn employee_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request("/employees", "name=Ann+Lee&department=QA"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = header(&resp, http::header::LOCATION)[0].to_string();
    assert!(location.starts_with("/employees/"));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&location))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let employee: Employee = body_json(resp).await;
    assert_eq!(employee.name, "Ann Lee");
    assert_eq!(employee.department, "QA");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/employees"))
        .await
        .unwrap();
    let employees: Vec<Employee> = body_json(resp).await;
    assert_eq!(employees, vec![employee]);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&location)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/employees"))
        .await
        .unwrap();
    let employees: Vec<Employee> = body_json(resp).await;
    assert!(employees.is_empty());
}
