//! HTTP grading service against a mock server.

mod common;

use chrono::Utc;
use common::collector;
use mockito::{Matcher, Server};
use quizguard_core::protocol::ViolationReport;
use quizguard_core::{
    CoreError, Effect, GradingService, HeadlessRenderer, HttpGradingService, NextResponse,
    ProbeConfig, ProtocolError, QuestionKind, SelectionSet, ServiceConfig, SessionConfig,
    SessionRuntime, TransportError, ViolationCategory,
};
use serde_json::json;
use std::sync::Arc;

fn service_for(server: &Server, cookie: Option<&str>) -> HttpGradingService {
    let config = ServiceConfig {
        base_url: server.url(),
        session_cookie: cookie.map(str::to_string),
        ..ServiceConfig::default()
    };
    HttpGradingService::new(&config).unwrap()
}

#[tokio::test]
async fn report_posts_category_with_cookie() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/cheat")
        .match_header("cookie", "session=abc123")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "type": "tab_switches" })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let service = service_for(&server, Some("session=abc123"));
    service
        .report_violation(&ViolationReport {
            category: ViolationCategory::TabSwitch,
            at: Utc::now(),
        })
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn submit_sends_sorted_answer_list() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/answer")
        .match_body(Matcher::Json(json!({ "answer": [0, 2] })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let selection: SelectionSet = [2, 0].into_iter().collect();
    service_for(&server, None)
        .submit_answer(&selection)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn next_decodes_question() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/next")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "finished": false,
                "question": {
                    "type": "multiple",
                    "question": "Which are primes?",
                    "options": ["2", "4", "5"]
                },
                "question_num": 2,
                "total_questions": 3,
                "is_last": false
            })
            .to_string(),
        )
        .create_async()
        .await;

    let resp = service_for(&server, None).next_question().await.unwrap();
    match resp {
        NextResponse::Question(q) => {
            assert_eq!(q.index, 2);
            assert_eq!(q.total_count, 3);
            assert_eq!(q.kind, QuestionKind::Multiple);
            assert_eq!(q.options.len(), 3);
            assert!(!q.is_last);
        }
        other => panic!("expected question, got {other:?}"),
    }
}

#[tokio::test]
async fn next_decodes_finished() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/next")
        .with_status(200)
        .with_body(r#"{"success": true, "finished": true, "redirect": "/submit"}"#)
        .create_async()
        .await;

    let resp = service_for(&server, None).next_question().await.unwrap();
    assert_eq!(
        resp,
        NextResponse::Finished {
            redirect: "/submit".into()
        }
    );
}

#[tokio::test]
async fn server_error_is_a_transport_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/next")
        .with_status(500)
        .create_async()
        .await;

    let err = service_for(&server, None).next_question().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Transport(TransportError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn non_json_body_is_a_protocol_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/next")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>Please log in</body></html>")
        .create_async()
        .await;

    let err = service_for(&server, None).next_question().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Protocol(ProtocolError::Malformed { .. })
    ));
}

#[tokio::test]
async fn missing_question_is_a_protocol_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/next")
        .with_status(200)
        .with_body(r#"{"finished": false, "question_num": 2, "total_questions": 3, "is_last": false}"#)
        .create_async()
        .await;

    let err = service_for(&server, None).next_question().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Protocol(ProtocolError::MissingField {
            field: "question",
            ..
        })
    ));
}

#[test]
fn bad_base_url_is_rejected() {
    let config = ServiceConfig {
        base_url: "not a url".into(),
        ..ServiceConfig::default()
    };
    assert!(matches!(
        HttpGradingService::new(&config),
        Err(CoreError::Transport(TransportError::InvalidUrl(_)))
    ));
}

#[tokio::test]
async fn full_session_against_http_service() {
    let mut server = Server::new_async().await;
    let answer = server
        .mock("POST", "/api/answer")
        .match_body(Matcher::Json(json!({ "answer": [1] })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;
    let next = server
        .mock("POST", "/api/next")
        .with_status(200)
        .with_body(r#"{"success": true, "finished": true, "redirect": "/submit"}"#)
        .create_async()
        .await;

    let service = Arc::new(service_for(&server, Some("session=xyz")));
    let (presenter, mut fx) = collector();
    let (runtime, handle) = SessionRuntime::new(
        SessionConfig {
            time_limit_secs: 0,
            initial_question: Some(common::question(3, 3, QuestionKind::Single)),
        },
        &ProbeConfig::default(),
        service,
        HeadlessRenderer::new(),
        presenter,
    );
    let task = tokio::spawn(runtime.run(true));

    handle.select(1).await.unwrap();
    handle.next().await.unwrap();
    let summary = task.await.unwrap();

    assert_eq!(summary.redirect.as_deref(), Some("/submit"));
    assert_eq!(summary.last_question, 3);
    answer.assert_async().await;
    next.assert_async().await;

    let mut navigated = false;
    while let Ok(effect) = fx.try_recv() {
        navigated |= matches!(effect, Effect::Navigate { .. });
    }
    assert!(navigated);
}
