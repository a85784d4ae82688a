use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quarry::watch::{CycleError, CycleRunner, Driver, DriverState};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

const DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Default)]
struct Counters {
    scans: AtomicUsize,
    deploys: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct FakeRunner {
    counters: Arc<Counters>,
    scan_time: Duration,
    fail_scan: bool,
    has_pending: bool,
}

impl FakeRunner {
    fn new(scan_time: Duration) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let runner = Self {
            counters: Arc::clone(&counters),
            scan_time,
            fail_scan: false,
            has_pending: false,
        };
        (runner, counters)
    }
}

#[async_trait]
impl CycleRunner for FakeRunner {
    type Scanned = ();
    type Pending = ();

    async fn scan(&self) -> Result<(), CycleError> {
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        sleep(self.scan_time).await;
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.scans.fetch_add(1, Ordering::SeqCst);

        if self.fail_scan {
            return Err(CycleError::Task("scan exploded".to_string()));
        }
        Ok(())
    }

    async fn diff(&self, _scanned: ()) -> Result<Option<()>, CycleError> {
        Ok(self.has_pending.then_some(()))
    }

    async fn deploy(&self, _pending: ()) -> Result<(), CycleError> {
        self.counters.deploys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn change() -> PathBuf {
    PathBuf::from("services/payments.ts")
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_runs_one_cycle() {
    let (runner, counters) = FakeRunner::new(Duration::ZERO);
    let driver = Driver::new(runner, DEBOUNCE);
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async move {
        for _ in 0..5 {
            tx.send(change()).unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_secs(3)).await;
        stop_tx.send(()).unwrap();
        tx
    };
    let stop = async {
        let _ = stop_rx.await;
    };
    tokio::join!(driver.run(rx, stop), script);

    assert_eq!(counters.scans.load(Ordering::SeqCst), 1);
    let status = driver.status();
    assert_eq!(status.cycles, 1);
    assert_eq!(status.state, DriverState::Idle);
    assert!(!status.watching);
}

#[tokio::test(start_paused = true)]
async fn test_changes_during_a_cycle_queue_one_more() {
    let (runner, counters) = FakeRunner::new(Duration::from_secs(1));
    let driver = Driver::new(runner, DEBOUNCE);
    let status = driver.subscribe();
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async move {
        tx.send(change()).unwrap();
        // debounce elapses at 500ms, the scan runs until 1500ms
        sleep(Duration::from_millis(700)).await;
        let observed = status.borrow().state;
        tx.send(change()).unwrap();
        sleep(Duration::from_millis(100)).await;
        tx.send(change()).unwrap();
        sleep(Duration::from_secs(5)).await;
        stop_tx.send(()).unwrap();
        (tx, observed)
    };
    let stop = async {
        let _ = stop_rx.await;
    };
    let (_, (_tx, observed)) = tokio::join!(driver.run(rx, stop), script);

    assert_eq!(observed, DriverState::Scanning);
    assert_eq!(counters.scans.load(Ordering::SeqCst), 2);
    assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(driver.status().cycles, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_lets_in_flight_cycle_finish() {
    let (runner, counters) = FakeRunner::new(Duration::from_secs(1));
    let driver = Driver::new(runner, DEBOUNCE);
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async move {
        tx.send(change()).unwrap();
        sleep(Duration::from_millis(600)).await;
        // queued behind the running cycle; never scanned
        tx.send(change()).unwrap();
        sleep(Duration::from_millis(100)).await;
        stop_tx.send(()).unwrap();
        tx
    };
    let stop = async {
        let _ = stop_rx.await;
    };
    tokio::join!(driver.run(rx, stop), script);

    assert_eq!(counters.scans.load(Ordering::SeqCst), 1);
    assert_eq!(counters.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(driver.status().cycles, 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_ends_run() {
    let (runner, counters) = FakeRunner::new(Duration::ZERO);
    let driver = Driver::new(runner, DEBOUNCE);
    let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
    drop(tx);

    driver.run(rx, std::future::pending()).await;

    assert_eq!(counters.scans.load(Ordering::SeqCst), 0);
    assert!(!driver.status().watching);
}

#[tokio::test]
async fn test_cycle_deploys_pending_changes() {
    let (mut runner, counters) = FakeRunner::new(Duration::ZERO);
    runner.has_pending = true;
    let driver = Driver::new(runner, DEBOUNCE);

    driver.cycle().await;
    assert_eq!(counters.deploys.load(Ordering::SeqCst), 1);

    let status = driver.status();
    assert_eq!(status.cycles, 1);
    assert_eq!(status.last_error, None);
}

#[tokio::test]
async fn test_failed_cycle_is_published_and_not_fatal() {
    let (mut runner, counters) = FakeRunner::new(Duration::ZERO);
    runner.fail_scan = true;
    runner.has_pending = true;
    let driver = Driver::new(runner, DEBOUNCE);
    let mut status = driver.subscribe();

    driver.cycle().await;
    driver.cycle().await;

    assert!(status.has_changed().unwrap());
    let latest = status.borrow_and_update().clone();
    assert_eq!(latest.cycles, 2);
    assert_eq!(latest.state, DriverState::Idle);
    assert_eq!(
        latest.last_error.as_deref(),
        Some("background task failed: scan exploded")
    );
    assert_eq!(counters.scans.load(Ordering::SeqCst), 2);
    assert_eq!(counters.deploys.load(Ordering::SeqCst), 0);
}
