//! Integration tests for the probing engine.
//!
//! These tests verify classification, ordering, concurrency, and failure
//! containment using mock HTTP servers; no real network requests are made.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use httptest::{matchers::*, responders::*, Expectation, Server};

use common::{catalog, refused_addr, site, spawn_stub_server, status_site, RecordingNotify};
use venor::catalog::ClassifyRule;
use venor::transport::{IdentityRotator, TransportError};
use venor::{
    check_username, check_username_over, Connection, QueryStatus, RunOptions, SilentNotify,
    TransportMode,
};

fn direct() -> RunOptions {
    RunOptions {
        transport: TransportMode::Direct,
        timeout: None,
    }
}

#[tokio::test]
async fn status_code_rule_claims_on_2xx_and_releases_on_404() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/taken/alice"))
            .respond_with(status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/free/alice"))
            .respond_with(status_code(404)),
    );

    let sites = catalog(vec![
        status_site("Taken", &format!("http://{}/taken/{}", server.addr(), "{}")),
        status_site("Free", &format!("http://{}/free/{}", server.addr(), "{}")),
    ]);

    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    assert_eq!(results.get("Taken").unwrap().status, QueryStatus::Claimed);
    assert_eq!(results.get("Taken").unwrap().http_status, Some(200));
    assert!(results.get("Taken").unwrap().latency.is_some());
    assert_eq!(results.get("Free").unwrap().status, QueryStatus::Available);
    assert_eq!(results.get("Free").unwrap().http_status, Some(404));
}

#[tokio::test]
async fn head_only_sites_probe_with_head() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("HEAD", "/alice"))
            .respond_with(status_code(200)),
    );

    let sites = catalog(vec![site(
        "Heady",
        &format!("http://{}/{}", server.addr(), "{}"),
        ClassifyRule::StatusCode { head_only: true },
    )]);

    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    assert_eq!(results.get("Heady").unwrap().status, QueryStatus::Claimed);
}

#[tokio::test]
async fn message_rule_reads_body_needles() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/gone/alice"))
            .respond_with(status_code(200).body("<h1>sorry, no user by that name</h1>")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/here/alice"))
            .respond_with(status_code(200).body("<h1>alice's profile</h1>")),
    );

    let rule = || ClassifyRule::Message {
        needles: vec!["not found".to_string(), "no user".to_string()],
    };
    let sites = catalog(vec![
        site(
            "Gone",
            &format!("http://{}/gone/{}", server.addr(), "{}"),
            rule(),
        ),
        site(
            "Here",
            &format!("http://{}/here/{}", server.addr(), "{}"),
            rule(),
        ),
    ]);

    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    assert_eq!(results.get("Gone").unwrap().status, QueryStatus::Available);
    assert_eq!(results.get("Here").unwrap().status, QueryStatus::Claimed);
    assert!(results
        .get("Here")
        .unwrap()
        .response_body
        .contains("profile"));
}

#[tokio::test]
async fn response_url_rule_follows_redirects() {
    let server = Server::run();
    let target = format!("http://{}/profile", server.addr());
    server.expect(
        Expectation::matching(request::method_path("GET", "/alice"))
            .respond_with(status_code(302).append_header("Location", target.as_str())),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/profile"))
            .respond_with(status_code(200)),
    );

    let sites = catalog(vec![site(
        "Redirecty",
        &format!("http://{}/{}", server.addr(), "{}"),
        ClassifyRule::ResponseUrl,
    )]);

    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    assert_eq!(
        results.get("Redirecty").unwrap().status,
        QueryStatus::Claimed
    );
}

#[tokio::test]
async fn status_code_rule_does_not_follow_redirects() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/alice"))
            .respond_with(status_code(301).append_header("Location", "/profile")),
    );

    let sites = catalog(vec![site(
        "NoFollow",
        &format!("http://{}/{}", server.addr(), "{}"),
        ClassifyRule::StatusCode { head_only: false },
    )]);

    // The 301 is classified as-is; /profile is never requested.
    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    assert_eq!(
        results.get("NoFollow").unwrap().status,
        QueryStatus::Available
    );
    assert_eq!(results.get("NoFollow").unwrap().http_status, Some(301));
}

#[tokio::test]
async fn illegal_username_makes_no_network_call() {
    let server = Server::run();
    // The server must see zero requests for the filtered site; the
    // responder exists only to complete the expectation and never runs.
    server.expect(
        Expectation::matching(any())
            .times(0)
            .respond_with(status_code(500)),
    );

    let mut filtered = status_site("Picky", &format!("http://{}/{}", server.addr(), "{}"));
    filtered.username_filter = Some(regex::Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
    let sites = catalog(vec![filtered]);

    let notifier = RecordingNotify::new();
    let results = check_username("not a valid name!", &sites, &direct(), &*notifier)
        .await
        .unwrap();

    let outcome = results.get("Picky").unwrap();
    assert_eq!(outcome.status, QueryStatus::Illegal);
    assert!(outcome.latency.is_none());
    assert!(outcome.http_status.is_none());
    // Illegal results are still notified, in catalog order.
    assert_eq!(
        notifier.events(),
        vec!["start:not a valid name!", "update:Picky:Illegal", "finish"]
    );
}

#[tokio::test]
async fn connection_refused_is_contained_as_unknown() {
    let dead = refused_addr().await;
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/alice"))
            .respond_with(status_code(200)),
    );

    let sites = catalog(vec![
        status_site("Dead", &format!("http://{dead}/{}", "{}")),
        status_site("Alive", &format!("http://{}/{}", server.addr(), "{}")),
    ]);

    let notifier = RecordingNotify::new();
    let results = check_username("alice", &sites, &direct(), &*notifier)
        .await
        .unwrap();

    let dead_outcome = results.get("Dead").unwrap();
    assert_eq!(dead_outcome.status, QueryStatus::Unknown);
    assert_eq!(dead_outcome.error_context(), Some("Error Connecting"));
    assert!(dead_outcome.latency.is_none());

    // The failure does not abort the run: the healthy site still resolves
    // and both are notified in catalog order.
    assert_eq!(results.get("Alive").unwrap().status, QueryStatus::Claimed);
    assert_eq!(
        notifier.events(),
        vec![
            "start:alice",
            "update:Dead:Unknown",
            "update:Alive:Claimed",
            "finish"
        ]
    );
}

#[tokio::test]
async fn probe_timeout_is_classified_as_timeout_error() {
    let (addr, _) = spawn_stub_server(Duration::from_secs(2), 200, "slow").await;
    let sites = catalog(vec![status_site("Slow", &format!("http://{addr}/{}", "{}"))]);

    let options = RunOptions {
        transport: TransportMode::Direct,
        timeout: Some(Duration::from_millis(100)),
    };
    let results = check_username("alice", &sites, &options, &SilentNotify)
        .await
        .unwrap();

    let outcome = results.get("Slow").unwrap();
    assert_eq!(outcome.status, QueryStatus::Unknown);
    assert_eq!(outcome.error_context(), Some("Timeout Error"));
}

#[tokio::test]
async fn notification_order_is_catalog_order_not_completion_order() {
    // First site in catalog order answers last.
    let (slow, _) = spawn_stub_server(Duration::from_millis(500), 200, "ok").await;
    let (fast, fast_counters) = spawn_stub_server(Duration::ZERO, 200, "ok").await;

    let sites = catalog(vec![
        status_site("Slowpoke", &format!("http://{slow}/{}", "{}")),
        status_site("Speedy", &format!("http://{fast}/{}", "{}")),
    ]);

    let notifier = RecordingNotify::new();
    let started = std::time::Instant::now();
    check_username("alice", &sites, &direct(), &*notifier)
        .await
        .unwrap();

    // Speedy's probe ran concurrently with Slowpoke's, not after it.
    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(fast_counters.total.load(Ordering::SeqCst), 1);
    assert_eq!(
        notifier.events(),
        vec![
            "start:alice",
            "update:Slowpoke:Claimed",
            "update:Speedy:Claimed",
            "finish"
        ]
    );
}

#[tokio::test]
async fn concurrency_never_exceeds_worker_cap() {
    let (addr, counters) = spawn_stub_server(Duration::from_millis(200), 200, "ok").await;

    let sites = catalog(
        (0..50)
            .map(|i| status_site(&format!("Site{i:02}"), &format!("http://{addr}/{i}/{}", "{}")))
            .collect(),
    );

    let results = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();

    assert_eq!(results.len(), 50);
    assert_eq!(counters.total.load(Ordering::SeqCst), 50);
    assert!(
        counters.peak.load(Ordering::SeqCst) <= 20,
        "peak concurrency {} exceeded the 20-worker cap",
        counters.peak.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn identity_rotation_happens_once_per_submitted_probe() {
    struct CountingRotator {
        rotations: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl IdentityRotator for CountingRotator {
        async fn rotate(&self) -> Result<(), TransportError> {
            self.rotations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let server = Server::run();
    for path in ["/a/alice", "/b/alice", "/c/alice"] {
        server.expect(
            Expectation::matching(request::method_path("GET", path))
                .respond_with(status_code(200)),
        );
    }

    let mut filtered = status_site("Skipped", &format!("http://{}/d/{}", server.addr(), "{}"));
    filtered.username_filter = Some(regex::Regex::new(r"^\d+$").unwrap());
    let sites = catalog(vec![
        status_site("A", &format!("http://{}/a/{}", server.addr(), "{}")),
        status_site("B", &format!("http://{}/b/{}", server.addr(), "{}")),
        filtered,
        status_site("C", &format!("http://{}/c/{}", server.addr(), "{}")),
    ]);

    let rotator = Arc::new(CountingRotator {
        rotations: AtomicUsize::new(0),
    });
    let connection = Connection::open(&TransportMode::Direct)
        .unwrap()
        .with_rotator(Arc::clone(&rotator) as Arc<dyn IdentityRotator>);

    check_username_over("alice", &sites, &connection, None, &SilentNotify)
        .await
        .unwrap();

    // Three submitted probes, three rotations; the filtered site rotates
    // nothing because nothing was submitted for it.
    assert_eq!(rotator.rotations.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn repeated_runs_give_identical_verdicts() {
    let (claimed, _) = spawn_stub_server(Duration::ZERO, 200, "profile page").await;
    let (available, _) = spawn_stub_server(Duration::ZERO, 200, "no user here").await;
    let (missing, _) = spawn_stub_server(Duration::ZERO, 404, "").await;

    let sites = catalog(vec![
        status_site("Claimed", &format!("http://{claimed}/{}", "{}")),
        site(
            "Messaged",
            &format!("http://{available}/{}", "{}"),
            ClassifyRule::Message {
                needles: vec!["no user".to_string()],
            },
        ),
        status_site("Missing", &format!("http://{missing}/{}", "{}")),
    ]);

    let first = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();
    let second = check_username("alice", &sites, &direct(), &SilentNotify)
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.site, b.site);
        assert_eq!(a.status, b.status);
        assert_eq!(a.http_status, b.http_status);
    }
}
