//! Session behavior of the executor against a scripted transport.

mod common;

use std::time::Duration;

use common::{fixture, BACKEND};
use serde_json::{json, Value};
use session_http::api::{account, auth};
use session_http::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use session_http::{
    Body, ExecutionContext, HttpBody, HttpError, HttpMethod, MultipartBody, Redirect,
    RequestError, RequestOptions, TokenStore,
};

const LOGIN_OK: &str = r#"{
    "message": "Login successful",
    "data": {
        "accessToken": "A",
        "refreshToken": "B",
        "account": { "id": 1, "name": "Owner", "email": "owner@example.com", "role": "Owner" }
    }
}"#;

const UNAUTHORIZED: &str = r#"{"message":"Access token is missing or expired"}"#;

fn me_url() -> String {
    format!("{BACKEND}/accounts/me")
}

#[tokio::test]
async fn login_then_get_attaches_stored_bearer() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond("/api/auth/login", 200, LOGIN_OK);
    f.transport.respond(&me_url(), 200, r#"{"message":"ok","data":{"id":1,"name":"Owner","email":"owner@example.com","role":"Owner"}}"#);

    let body = auth::LoginBody {
        email: "owner@example.com".to_string(),
        password: "123456".to_string(),
    };
    let login = auth::client_login(&f.client, &body).await.unwrap();
    assert_eq!(login.status, 200);
    assert_eq!(login.payload.data.access_token, "A");

    assert_eq!(f.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A"));
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY).as_deref(), Some("B"));

    f.client.get::<Value>("accounts/me", RequestOptions::new()).await.unwrap();
    let sent = f.transport.sent();
    let me = sent.last().unwrap();
    assert_eq!(me.url, me_url());
    assert_eq!(me.header("Authorization"), Some("Bearer A"));
}

#[tokio::test]
async fn login_without_account_still_stores_tokens() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond(
        "/api/auth/login",
        200,
        r#"{"message":"ok","data":{"accessToken":"A","refreshToken":"B"}}"#,
    );

    let body = auth::LoginBody {
        email: "owner@example.com".to_string(),
        password: "123456".to_string(),
    };
    let login = auth::client_login(&f.client, &body).await.unwrap();

    assert_eq!(login.payload.data.account, None);
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A"));
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY).as_deref(), Some("B"));
}

#[tokio::test]
async fn login_tokens_are_stored_even_if_caller_type_does_not_fit() {
    #[derive(Debug, serde::Deserialize)]
    struct Strict {
        #[allow(dead_code)]
        session_id: String,
    }

    let f = fixture(ExecutionContext::Client);
    f.transport.respond("/api/auth/login", 200, LOGIN_OK);

    let err = f
        .client
        .post::<Strict, _>("api/auth/login", &json!({}), RequestOptions::local())
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Decode(_)));
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A"));
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY).as_deref(), Some("B"));
}

#[tokio::test]
async fn login_path_matches_with_or_without_leading_slash() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond("/api/auth/login", 200, LOGIN_OK);

    f.client
        .post::<Value, _>("api/auth/login", &json!({ "email": "x@y.z" }), RequestOptions::local())
        .await
        .unwrap();

    assert_eq!(f.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A"));
}

#[tokio::test]
async fn local_logout_response_clears_both_tokens() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.store.set(REFRESH_TOKEN_KEY, "B");
    f.transport.respond("/api/auth/logout", 200, r#"{"message":"Logged out"}"#);

    auth::client_logout(&f.client).await.unwrap();

    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(f.transport.sent()[0].body, None);
}

#[tokio::test]
async fn unauthorized_in_client_context_ends_session_once() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.store.set(REFRESH_TOKEN_KEY, "B");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport.respond("/api/auth/logout", 200, r#"{"message":"Logged out"}"#);

    let err = f
        .client
        .get::<Value>("/accounts/me", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Redirected(Redirect::Browser(ref to)) if to == "/login"));
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 1);
    assert_eq!(f.navigator.visited(), vec!["/login"]);
    assert!(!f.client.session().is_logging_out());

    let logout = f
        .transport
        .sent()
        .into_iter()
        .find(|request| request.url == "/api/auth/logout")
        .unwrap();
    assert_eq!(logout.method, HttpMethod::Post);
    assert_eq!(logout.header("Authorization"), Some("Bearer A"));
}

#[tokio::test]
async fn concurrent_unauthorized_responses_share_one_logout() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.store.set(REFRESH_TOKEN_KEY, "B");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport
        .respond(&format!("{BACKEND}/orders"), 401, UNAUTHORIZED);
    f.transport.respond_after(
        "/api/auth/logout",
        200,
        r#"{"message":"Logged out"}"#,
        Duration::from_millis(50),
    );

    let (first, second) = tokio::join!(
        f.client.get::<Value>("accounts/me", RequestOptions::new()),
        f.client.get::<Value>("orders", RequestOptions::new()),
    );

    for result in [first, second] {
        assert!(matches!(result, Err(RequestError::Redirected(Redirect::Browser(_)))));
    }
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 1);
    assert_eq!(f.navigator.visited(), vec!["/login"]);
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY), None);
}

#[test]
fn concurrent_unauthorized_on_multi_thread_runtime_share_one_logout() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport.respond_after(
        "/api/auth/logout",
        200,
        "{}",
        Duration::from_millis(100),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    let client = f.client.clone();
    runtime.block_on(async move {
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    client.get::<Value>("accounts/me", RequestOptions::new()).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap_err().is_redirect());
        }
    });

    assert_eq!(f.transport.sent_to("/api/auth/logout"), 1);
    assert_eq!(f.navigator.visited().len(), 1);
}

#[tokio::test]
async fn failed_logout_call_still_clears_and_navigates() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.store.set(REFRESH_TOKEN_KEY, "B");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport.fail_after("/api/auth/logout", Duration::from_millis(5));

    let err = f
        .client
        .get::<Value>("accounts/me", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_redirect());
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(f.navigator.last().as_deref(), Some("/login"));
}

#[tokio::test]
async fn logout_error_status_is_ignored() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport.respond("/api/auth/logout", 500, r#"{"message":"boom"}"#);

    let err = f
        .client
        .get::<Value>("accounts/me", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_redirect());
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn later_unauthorized_starts_a_new_logout() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport.respond("/api/auth/logout", 200, "{}");

    for _ in 0..2 {
        let err = f
            .client
            .get::<Value>("accounts/me", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_redirect());
    }

    assert_eq!(f.transport.sent_to("/api/auth/logout"), 2);
    assert_eq!(f.navigator.visited(), vec!["/login", "/login"]);
}

#[tokio::test]
async fn abandoned_logout_still_ends_session() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.store.set(REFRESH_TOKEN_KEY, "B");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport
        .respond(&format!("{BACKEND}/orders"), 200, r#"{"data":[]}"#);
    f.transport.respond_after(
        "/api/auth/logout",
        200,
        "{}",
        Duration::from_millis(50),
    );

    let outcome = tokio::time::timeout(
        Duration::from_millis(10),
        f.client.get::<Value>("accounts/me", RequestOptions::new()),
    )
    .await;
    assert!(outcome.is_err());

    assert!(!f.client.session().is_logging_out());
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(f.store.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(f.navigator.visited(), vec!["/login"]);
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 1);

    f.client
        .get::<Value>("orders", RequestOptions::new())
        .await
        .unwrap();
    let orders = f.transport.sent().pop().unwrap();
    assert_eq!(orders.header("Authorization"), None);
}

#[tokio::test]
async fn logout_keeps_running_while_another_caller_waits() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);
    f.transport
        .respond(&format!("{BACKEND}/orders"), 401, UNAUTHORIZED);
    f.transport.respond_after(
        "/api/auth/logout",
        200,
        "{}",
        Duration::from_millis(50),
    );

    let (first, second) = tokio::join!(
        tokio::time::timeout(
            Duration::from_millis(10),
            f.client.get::<Value>("accounts/me", RequestOptions::new()),
        ),
        f.client.get::<Value>("orders", RequestOptions::new()),
    );

    assert!(first.is_err());
    assert!(second.unwrap_err().is_redirect());
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 1);
    assert_eq!(f.navigator.visited(), vec!["/login"]);
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn unauthorized_in_server_context_redirects_with_request_token() {
    let f = fixture(ExecutionContext::Server);
    f.store.set(ACCESS_TOKEN_KEY, "stored");
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);

    let err = f
        .client
        .get::<Value>(
            "accounts/me",
            RequestOptions::new().header("Authorization", "Bearer from-cookie"),
        )
        .await
        .unwrap_err();

    match err {
        RequestError::Redirected(redirect) => assert_eq!(
            redirect,
            Redirect::Server("/logout?accessToken=from-cookie".to_string())
        ),
        other => panic!("expected redirect, got {other:?}"),
    }
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 0);
    assert!(f.navigator.visited().is_empty());
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("stored"));
}

#[tokio::test]
async fn unauthorized_in_server_context_without_token_redirects_to_bare_logout() {
    let f = fixture(ExecutionContext::Server);
    f.transport.respond(&me_url(), 401, UNAUTHORIZED);

    let err = f
        .client
        .get::<Value>("accounts/me", RequestOptions::new())
        .await
        .unwrap_err();

    match err {
        RequestError::Redirected(redirect) => {
            assert_eq!(redirect, Redirect::Server("/logout".to_string()))
        }
        other => panic!("expected redirect, got {other:?}"),
    }
    assert_eq!(f.transport.sent()[0].header("Authorization"), None);
    assert_eq!(f.transport.sent_to("/api/auth/logout"), 0);
    assert!(f.navigator.visited().is_empty());
}

#[tokio::test]
async fn server_context_login_leaves_storage_alone() {
    let f = fixture(ExecutionContext::Server);
    f.transport.respond(&format!("{BACKEND}/auth/login"), 200, LOGIN_OK);

    let body = auth::LoginBody {
        email: "owner@example.com".to_string(),
        password: "123456".to_string(),
    };
    let response = auth::server_login(&f.client, &body).await.unwrap();

    assert_eq!(response.payload.data.refresh_token, "B");
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn forbidden_is_a_generic_error_with_exact_payload() {
    let f = fixture(ExecutionContext::Client);
    let body = r#"{"message":"Only owners can open the dashboard","code":"FORBIDDEN"}"#;
    f.transport
        .respond(&format!("{BACKEND}/dashboard/admin"), 403, body);

    let err = f
        .client
        .get::<Value>("dashboard/admin", RequestOptions::new())
        .await
        .unwrap_err();

    let expected: Value = serde_json::from_str(body).unwrap();
    match err {
        RequestError::Http(HttpError::Generic { status, payload }) => {
            assert_eq!(status, 403);
            assert_eq!(payload, expected);
        }
        other => panic!("expected generic error, got {other:?}"),
    }
    assert!(f.navigator.visited().is_empty());
}

#[tokio::test]
async fn validation_failure_is_an_entity_error() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond(
        "/api/auth/login",
        422,
        r#"{"message":"Validation failed","errors":[{"field":"email","message":"Email is invalid"}]}"#,
    );

    let body = auth::LoginBody {
        email: "bad".to_string(),
        password: "123456".to_string(),
    };
    let err = auth::client_login(&f.client, &body).await.unwrap_err();

    match err.as_http() {
        Some(HttpError::Entity(entity)) => {
            assert_eq!(entity.status(), 422);
            assert_eq!(entity.field_message("email"), Some("Email is invalid"));
        }
        other => panic!("expected entity error, got {other:?}"),
    }
    assert_eq!(f.store.get(ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn multipart_body_reaches_transport_untouched() {
    let f = fixture(ExecutionContext::Client);
    f.store.set(ACCESS_TOKEN_KEY, "A");
    f.transport
        .respond(&format!("{BACKEND}/media/upload"), 200, r#"{"message":"ok","data":"/img.png"}"#);

    let form = MultipartBody::new("xyz", b"--xyz\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\nhi\r\n--xyz--\r\n".to_vec());
    f.client
        .execute::<Value>(
            HttpMethod::Post,
            "/media/upload",
            RequestOptions::new().body(Body::Multipart(form.clone())),
        )
        .await
        .unwrap();

    let sent = &f.transport.sent()[0];
    assert_eq!(sent.header("Content-Type"), None);
    assert_eq!(sent.header("Authorization"), Some("Bearer A"));
    assert_eq!(sent.body, Some(HttpBody::Multipart(form)));
}

#[tokio::test]
async fn verbs_send_their_method_and_body() {
    let f = fixture(ExecutionContext::Client);
    let url = format!("{BACKEND}/dishes/7");
    f.transport.respond(&url, 200, r#"{"message":"ok"}"#);

    f.client
        .put::<Value, _>("dishes/7", &json!({ "price": 10 }), RequestOptions::new())
        .await
        .unwrap();
    f.client
        .delete::<Value>("/dishes/7", RequestOptions::new())
        .await
        .unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent[0].method, HttpMethod::Put);
    assert_eq!(sent[0].body, Some(HttpBody::Json(r#"{"price":10}"#.to_string())));
    assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
    assert_eq!(sent[1].method, HttpMethod::Delete);
    assert_eq!(sent[1].body, None);
}

#[tokio::test]
async fn fetch_profile_fills_the_profile_cache() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond(
        &me_url(),
        200,
        r#"{"message":"ok","data":{"id":2,"name":"Staff","email":"staff@example.com","role":"Employee","avatar":null}}"#,
    );

    let account = account::fetch_profile(&f.client).await.unwrap();

    assert_eq!(account.id, 2);
    assert_eq!(f.client.session().profile().get(), Some(account));
}

#[tokio::test]
async fn undecodable_success_payload_is_a_decode_error() {
    let f = fixture(ExecutionContext::Client);
    f.transport.respond(&me_url(), 200, r#"{"unexpected":true}"#);

    let err = account::me(&f.client).await.unwrap_err();
    assert!(matches!(err, RequestError::Decode(_)));
}
