mod common;

use std::time::{Duration, Instant};

use common::{client_for, completed, in_progress, SequenceResponder};
use deep_research::{PollOptions, Poller, ResearchError, SystemClock, TaskSpec, TokioSleeper};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_options() -> PollOptions {
    PollOptions {
        poll_interval: Duration::from_millis(10),
        ..PollOptions::default()
    }
}

async fn mount_submit(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/interactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_polls_until_completed() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_run")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_run"))
        .respond_with(SequenceResponder::new(vec![
            in_progress("v1_run"),
            json!({ "name": "interactions/v1_run", "status": "IN_PROGRESS" }),
            completed("v1_run", &["draft", "X"]),
        ]))
        .expect(3)
        .mount(&server)
        .await;

    let poller = Poller::with_options(client_for(&server), fast_options());
    let completion = poller
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap();

    assert_eq!(completion.text, "X");
    assert_eq!(completion.task_id.as_str(), "v1_run");
}

#[tokio::test]
async fn test_run_submission_failure_skips_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/interactions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(in_progress("never")))
        .expect(0)
        .mount(&server)
        .await;

    let err = Poller::with_options(client_for(&server), fast_options())
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();

    assert!(matches!(err, ResearchError::SubmissionFailed(_)));
}

#[tokio::test]
async fn test_run_polling_failure_is_not_retried() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_broken")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = Poller::with_options(client_for(&server), fast_options())
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();

    assert!(matches!(err, ResearchError::PollingFailed { .. }));
}

#[tokio::test]
async fn test_run_remote_failure_and_empty_output() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_fail")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_fail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "v1_fail",
            "status": "failed",
            "error": "research budget exhausted"
        })))
        .mount(&server)
        .await;

    let err = Poller::with_options(client_for(&server), fast_options())
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResearchError::RemoteTaskFailed { ref detail, .. } if detail == "research budget exhausted"
    ));

    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_empty")).await;
    Mock::given(method("GET"))
        .and(path("/interactions/v1_empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed("v1_empty", &[])))
        .mount(&server)
        .await;

    let err = Poller::with_options(client_for(&server), fast_options())
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();
    assert!(matches!(err, ResearchError::EmptyOutput { .. }));
}

#[tokio::test]
async fn test_run_times_out_on_stuck_task() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_stuck")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_stuck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(in_progress("v1_stuck")))
        .mount(&server)
        .await;

    let options = PollOptions {
        timeout: Some(Duration::from_millis(50)),
        ..fast_options()
    };
    let err = Poller::with_options(client_for(&server), options)
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();

    assert!(matches!(err, ResearchError::Timeout { .. }));
}

#[tokio::test]
async fn test_independent_runs_share_one_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/interactions"))
        .respond_with(SequenceResponder::new(vec![in_progress("a"), in_progress("b")]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interactions/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed("a", &["report a"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interactions/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed("b", &["report b"])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = Poller::with_options(client.clone(), fast_options());
    let second = Poller::with_options(client, fast_options());
    let spec = TaskSpec::new("query");

    let (a, b) = tokio::join!(
        first.run(&spec, &SystemClock, &TokioSleeper),
        second.run(&spec, &SystemClock, &TokioSleeper)
    );

    let mut texts = vec![a.unwrap().text, b.unwrap().text];
    texts.sort();
    assert_eq!(texts, vec!["report a", "report b"]);
}

#[tokio::test]
async fn test_run_deadline_interrupts_slow_status_check() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_slow")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(in_progress("v1_slow"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let options = PollOptions {
        timeout: Some(Duration::from_millis(100)),
        ..fast_options()
    };
    let started = Instant::now();
    let err = Poller::with_options(client_for(&server), options)
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();

    assert!(matches!(err, ResearchError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_run_deadline_shortens_long_poll_interval() {
    let server = MockServer::start().await;
    mount_submit(&server, in_progress("v1_patient")).await;

    Mock::given(method("GET"))
        .and(path("/interactions/v1_patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(in_progress("v1_patient")))
        .expect(1)
        .mount(&server)
        .await;

    let options = PollOptions {
        poll_interval: Duration::from_secs(3),
        timeout: Some(Duration::from_millis(100)),
        ..PollOptions::default()
    };
    let started = Instant::now();
    let err = Poller::with_options(client_for(&server), options)
        .run(&TaskSpec::new("query"), &SystemClock, &TokioSleeper)
        .await
        .unwrap_err();

    assert!(matches!(err, ResearchError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));
}
