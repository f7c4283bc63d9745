mod support;

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
    sync::Arc,
    time::Duration,
};

use tokio_util::sync::CancellationToken;

use super::{DispatchConfig, Dispatcher, SessionMode};
use crate::{AuthError, CompletionLedger, CoreError, LedgerAppender, partition};
use support::{FakePlatform, jobs, numbered_jobs};

fn config(width: usize) -> DispatchConfig {
    DispatchConfig {
        shuffle_seed: Some(42),
        ..DispatchConfig::with_width(width).unwrap()
    }
}

fn dispatcher(platform: &Arc<FakePlatform>, cfg: DispatchConfig) -> Dispatcher<FakePlatform> {
    Dispatcher::new(Arc::clone(platform), cfg).unwrap()
}

fn assert_each_session_closed_once(platform: &FakePlatform) {
    let closes = platform.closes();
    assert_eq!(closes.len(), platform.logins(), "every session must be closed");
    assert!(
        closes.values().all(|&n| n == 1),
        "sessions closed more than once: {closes:?}"
    );
}

#[tokio::test]
async fn ledger_filter_then_partition_matches_reference_split() {
    let ledger = CompletionLedger::from_ids(["B"]);
    let candidates = ledger.filter(jobs(&["A", "B", "C", "D", "E"]));
    let chunks = partition(candidates, NonZeroUsize::new(2).unwrap());

    let names: Vec<Vec<&str>> = chunks
        .iter()
        .map(|c| c.iter().map(|j| j.expression()).collect())
        .collect();
    assert_eq!(names, vec![vec!["A", "C"], vec!["D", "E"]]);
}

#[tokio::test]
async fn candidates_are_a_shuffled_subset_excluding_the_ledger() {
    let platform = Arc::new(FakePlatform::new());
    let d = dispatcher(&platform, config(2));

    let ledger = CompletionLedger::from_ids(["B"]);
    let (candidates, skipped) = d.candidates(jobs(&["A", "B", "C", "D", "E"]), &ledger);

    assert_eq!(skipped, 1);
    let got: HashSet<&str> = candidates.iter().map(|j| j.expression()).collect();
    assert_eq!(got, HashSet::from(["A", "C", "D", "E"]));
}

#[tokio::test(start_paused = true)]
async fn every_pending_job_is_submitted_once() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_millis(10)));
    let report = dispatcher(&platform, config(3))
        .run(numbered_jobs(20), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.dispatched, 20);
    assert_eq!(report.submitted, 20);
    assert!(report.is_clean());

    let submitted: HashSet<String> = platform.submitted().into_iter().map(|(_, e)| e).collect();
    assert_eq!(submitted.len(), 20);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn in_flight_submissions_never_exceed_width() {
    for width in [1, 2, 3, 5] {
        let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_millis(25)));
        let report = dispatcher(&platform, config(width))
            .run(numbered_jobs(37), &CompletionLedger::empty(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.submitted, 37);
        assert!(platform.peak() <= width, "width={width} peak={}", platform.peak());
        assert!(report.peak_in_flight <= width);
    }
}

#[tokio::test(start_paused = true)]
async fn chunk_jobs_use_their_slot_session() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_millis(5)));
    let d = dispatcher(&platform, config(3));

    let all = numbered_jobs(9);
    let (candidates, _) = d.candidates(all.clone(), &CompletionLedger::empty());
    let chunks = partition(candidates, d.config().width);

    d.run(all, &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    for (session, expr) in platform.submitted() {
        assert!(
            chunks[session].iter().any(|j| j.expression() == expr),
            "{expr} ran on session {session} outside its chunk"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn idle_slots_are_still_created_and_torn_down() {
    let platform = Arc::new(FakePlatform::new());
    let report = dispatcher(&platform, config(5))
        .run(jobs(&["A", "B", "C"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.submitted, 3);
    assert_eq!(report.sessions_closed, 5);
    assert_eq!(platform.logins(), 5);

    let used: HashSet<usize> = platform.submitted().into_iter().map(|(s, _)| s).collect();
    assert_eq!(used, HashSet::from([0, 1, 2]));
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn sessions_are_torn_down_when_every_submission_fails() {
    let platform = Arc::new(
        ["A", "B", "C", "D"]
            .into_iter()
            .fold(FakePlatform::new(), |p, e| p.transient_on(e)),
    );
    let report = dispatcher(&platform, config(2))
        .run(jobs(&["A", "B", "C", "D"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failed, 4);
    assert_eq!(report.submitted, 0);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn login_failure_aborts_and_closes_partial_pool() {
    let platform = Arc::new(FakePlatform::new().failing_login_at(1));
    let err = dispatcher(&platform, config(3))
        .run(jobs(&["A", "B"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Auth(AuthError::Rejected(_))));
    assert!(platform.submitted().is_empty());
    assert_eq!(platform.closes().get(&0), Some(&1));
    assert_eq!(platform.closes().len(), 1);
}

#[tokio::test]
async fn transient_failure_is_retried_by_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records").join("run_simulated_alpha_expression.txt");
    let all = ["A", "B", "C", "D", "E"];

    let first = Arc::new(
        FakePlatform::new()
            .transient_on("C")
            .recording_to(LedgerAppender::new(&path)),
    );
    let ledger = CompletionLedger::load(&path).await.unwrap();
    let report = dispatcher(&first, config(2))
        .run(jobs(&all), &ledger, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.submitted, 4);
    assert_eq!(report.failed, 1);

    let ledger = CompletionLedger::load(&path).await.unwrap();
    assert_eq!(ledger.len(), 4);
    assert!(!ledger.contains("C"));

    let second = Arc::new(FakePlatform::new().recording_to(LedgerAppender::new(&path)));
    let report = dispatcher(&second, config(2))
        .run(jobs(&all), &ledger, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.skipped, 4);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.submitted, 1);
    assert_eq!(second.submitted(), vec![(0, "C".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn hung_submission_times_out_and_frees_its_permit() {
    let platform = Arc::new(
        FakePlatform::new()
            .with_delay(Duration::from_millis(10))
            .hanging_on("stuck"),
    );
    let cfg = DispatchConfig {
        submit_timeout: Duration::from_secs(5),
        ..config(1)
    };
    let report = dispatcher(&platform, cfg)
        .run(jobs(&["stuck", "A", "B"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.timed_out, 1);
    assert_eq!(report.submitted, 2);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_still_tears_down() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_secs(1)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = dispatcher(&platform, config(2))
        .run(numbered_jobs(6), &CompletionLedger::empty(), cancel)
        .await
        .unwrap();

    assert_eq!(report.cancelled, 6);
    assert!(platform.submitted().is_empty());
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_stops_waiting_and_in_flight_tasks() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_secs(10)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        trigger.cancel();
    });

    let report = dispatcher(&platform, config(2))
        .run(numbered_jobs(8), &CompletionLedger::empty(), cancel)
        .await
        .unwrap();

    assert_eq!(report.submitted, 2);
    assert_eq!(report.cancelled, 6);
    assert_eq!(report.finished(), 8);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_response_renews_the_lease() {
    let platform = Arc::new(FakePlatform::new().unauthorized_on("B"));
    let report = dispatcher(&platform, config(1))
        .run(jobs(&["A", "B", "C"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.submitted, 2);
    assert_eq!(platform.logins(), 2);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn expired_lease_is_renewed_before_next_submission() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_millis(600)));
    let cfg = DispatchConfig {
        session_ttl: Duration::from_secs(1),
        session_mode: SessionMode::Exclusive,
        ..config(1)
    };
    let report = dispatcher(&platform, cfg)
        .run(jobs(&["A", "B", "C"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.submitted, 3);
    assert_eq!(platform.logins(), 2);
    let sessions: Vec<usize> = platform.submitted().into_iter().map(|(s, _)| s).collect();
    assert_eq!(sessions, vec![0, 0, 1]);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn shared_session_survives_renewal_by_a_sibling() {
    let cfg = DispatchConfig {
        session_ttl: Duration::from_secs(1),
        ..config(2)
    };
    let all = numbered_jobs(5);
    let planner = dispatcher(&Arc::new(FakePlatform::new()), cfg.clone());
    let (candidates, _) = planner.candidates(all.clone(), &CompletionLedger::empty());
    let chunks = partition(candidates, cfg.width);

    // The first job outlives the ttl, so the third renews the session the second still uses.
    let platform = Arc::new(
        FakePlatform::new()
            .with_delay(Duration::from_millis(100))
            .with_delay_for(chunks[0][0].expression(), Duration::from_millis(1500))
            .with_delay_for(chunks[0][1].expression(), Duration::from_secs(5)),
    );
    let report = dispatcher(&platform, cfg)
        .run(all, &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failed, 0);
    assert_eq!(report.submitted, 5);
    assert!(platform.logins() > 2);
    assert_each_session_closed_once(&platform);
}

#[tokio::test(start_paused = true)]
async fn failed_relogin_leaves_the_old_session_closed_once() {
    let platform = Arc::new(
        FakePlatform::new()
            .with_delay(Duration::from_millis(100))
            .failing_logins_from(1),
    );
    let cfg = DispatchConfig {
        session_ttl: Duration::from_millis(50),
        ..config(1)
    };
    let report = dispatcher(&platform, cfg)
        .run(jobs(&["a", "b", "c"]), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.submitted, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.sessions_closed, 1);
    assert_eq!(platform.closes(), HashMap::from([(0, 1)]));
}

#[tokio::test(start_paused = true)]
async fn exclusive_mode_never_overlaps_on_one_session() {
    let platform = Arc::new(FakePlatform::new().with_delay(Duration::from_millis(20)));
    let cfg = DispatchConfig {
        session_mode: SessionMode::Exclusive,
        ..config(3)
    };
    let report = dispatcher(&platform, cfg)
        .run(numbered_jobs(30), &CompletionLedger::empty(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.submitted, 30);
    assert_eq!(platform.session_peak(), 1);
    assert!(platform.peak() <= 3);
}

#[tokio::test]
async fn empty_candidate_list_still_cycles_the_pool() {
    let platform = Arc::new(FakePlatform::new());
    let ledger = CompletionLedger::from_ids(["A", "B"]);
    let report = dispatcher(&platform, config(2))
        .run(jobs(&["A", "B"]), &ledger, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.dispatched, 0);
    assert_eq!(report.sessions_closed, 2);
    assert_each_session_closed_once(&platform);
}
