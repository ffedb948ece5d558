use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use super::configure_routes;
use crate::config::AppConfig;
use crate::state::AppState;

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(AppConfig::default())))
                .configure(configure_routes),
        )
        .await
    };
}

/// Send a request and decode the response envelope.
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Register `$username` and return the session cookie.
macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": $username,
                "email": format!("{}@example.com", $username),
                "password": "hunter22",
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        session_of(&resp)
    }};
}

fn session_of<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "forum_sid")
        .expect("session cookie")
        .into_owned()
}

fn new_post(title: &str) -> Value {
    json!({ "title": title, "text": "Body text of the post" })
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!();

    let (status, body) = call!(app, test::TestRequest::get().uri("/api/health"));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[actix_web::test]
async fn test_register_login_me_logout() {
    let app = test_app!();
    let session = register!(app, "alice_w");

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/api/auth/me").cookie(session.clone())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice_w");
    assert_eq!(body["data"]["email"], "alice_w@example.com");

    let (_, body) = call!(app, test::TestRequest::get().uri("/api/auth/me"));
    assert!(body["data"].is_null());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "usernameOrEmail": "alice_w@example.com", "password": "hunter22" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!session_of(&resp).value().is_empty());

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/auth/logout").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(session_of(&resp).value(), "");
}

#[actix_web::test]
async fn test_bearer_header_is_accepted() {
    let app = test_app!();
    let session = register!(app, "alice_w");

    let (_, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", session.value())))
    );

    assert_eq!(body["data"]["username"], "alice_w");
}

#[actix_web::test]
async fn test_register_validation_envelope() {
    let app = test_app!();

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri("/api/auth/register").set_json(json!({
            "username": "alice_w",
            "email": "no-at-sign",
            "password": "hunter22",
        }))
    );

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "email");
}

#[actix_web::test]
async fn test_anonymous_writes_are_unauthorized() {
    let app = test_app!();

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri("/api/posts").set_json(new_post("Hello"))
    );

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_vote_flow() {
    let app = test_app!();
    let alice = register!(app, "alice_w");
    let bob = register!(app, "bob_builder");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .cookie(alice.clone())
            .set_json(new_post("Hello"))
    );
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let vote_uri = format!("/api/posts/{id}/vote");

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&vote_uri)
            .cookie(bob.clone())
            .set_json(json!({ "value": 1 }))
    );
    assert_eq!(body["data"]["points"], 1);
    assert_eq!(body["data"]["voteType"], 1);

    // Repeat is a no-op
    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&vote_uri)
            .cookie(bob.clone())
            .set_json(json!({ "value": 1 }))
    );
    assert_eq!(body["data"]["points"], 1);

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&vote_uri)
            .cookie(bob.clone())
            .set_json(json!({ "value": -1 }))
    );
    assert_eq!(body["data"]["points"], -1);
    assert_eq!(body["data"]["voteType"], -1);

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&vote_uri)
            .cookie(bob.clone())
            .set_json(json!({ "value": 0 }))
    );
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "value");

    // Bob sees his vote and Alice's name but not her email.
    let (_, body) = call!(
        app,
        test::TestRequest::get().uri("/api/posts?limit=5").cookie(bob)
    );
    let post = &body["data"]["posts"][0];
    assert_eq!(body["data"]["totalCount"], 1);
    assert_eq!(body["data"]["hasMore"], false);
    assert_eq!(post["voteType"], -1);
    assert_eq!(post["author"]["username"], "alice_w");
    assert_eq!(post["author"]["email"], "");

    let (_, body) = call!(app, test::TestRequest::get().uri("/api/posts"));
    assert_eq!(body["data"]["posts"][0]["voteType"], 0);
}

#[actix_web::test]
async fn test_unusable_vote_values_are_field_errors() {
    let app = test_app!();
    let alice = register!(app, "alice_w");

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .cookie(alice.clone())
            .set_json(new_post("Hello"))
    );
    let vote_uri = format!("/api/posts/{}/vote", body["data"]["id"].as_str().unwrap());

    for payload in [
        json!({ "value": 40000 }),
        json!({ "value": 1.5 }),
        json!({ "value": "up" }),
        json!({}),
    ] {
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri(&vote_uri)
                .cookie(alice.clone())
                .set_json(payload)
        );
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "value");
    }
}

#[actix_web::test]
async fn test_feed_pages_with_cursor() {
    let app = test_app!();
    let alice = register!(app, "alice_w");

    for i in 0..3 {
        let (status, _) = call!(
            app,
            test::TestRequest::post()
                .uri("/api/posts")
                .cookie(alice.clone())
                .set_json(new_post(&format!("Post {i}")))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, first) = call!(app, test::TestRequest::get().uri("/api/posts?limit=2"));
    assert_eq!(first["data"]["posts"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"]["hasMore"], true);
    assert_eq!(first["data"]["posts"][0]["title"], "Post 2");

    let cursor = first["data"]["cursor"].as_str().unwrap();
    let req = test::TestRequest::get().uri(&format!("/api/posts?limit=2&cursor={}", cursor.replace('+', "%2B")));
    let (_, second) = call!(app, req);
    assert_eq!(second["data"]["posts"].as_array().unwrap().len(), 1);
    assert_eq!(second["data"]["posts"][0]["title"], "Post 0");
    assert_eq!(second["data"]["hasMore"], false);
}

#[actix_web::test]
async fn test_malformed_cursor_is_rejected() {
    let app = test_app!();

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/api/posts?cursor=yesterday")
    );

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "cursor");
}

#[actix_web::test]
async fn test_only_author_may_edit_or_delete() {
    let app = test_app!();
    let alice = register!(app, "alice_w");
    let bob = register!(app, "bob_builder");

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/posts")
            .cookie(alice.clone())
            .set_json(new_post("Hello"))
    );
    let uri = format!("/api/posts/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = call!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .cookie(bob.clone())
            .set_json(new_post("Hijacked"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call!(app, test::TestRequest::delete().uri(&uri).cookie(bob.clone()));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    call!(
        app,
        test::TestRequest::post()
            .uri(&format!("{uri}/vote"))
            .cookie(bob)
            .set_json(json!({ "value": 1 }))
    );

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .cookie(alice.clone())
            .set_json(new_post("Edited"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["points"], 1);

    let (status, body) = call!(app, test::TestRequest::delete().uri(&uri).cookie(alice));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["votesRemoved"], 1);

    let (_, body) = call!(app, test::TestRequest::get().uri(&uri));
    assert!(body["data"].is_null());
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_auth_limit_ignores_forwarded_for() {
    use std::sync::Arc;
    use std::time::Duration;

    use forum_infra::{InMemoryRateLimiter, RateLimitConfig};

    let mut state = AppState::in_memory(AppConfig::default());
    state.rate_limiter = Some(Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    })));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let peer = "10.0.0.9:40000".parse().unwrap();
    let mut statuses = Vec::new();
    for i in 0..4 {
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .peer_addr(peer)
            .insert_header(("X-Forwarded-For", format!("1.2.3.{i}")))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );

    // Another peer has its own quota.
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .peer_addr("10.0.0.10:40000".parse().unwrap())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
