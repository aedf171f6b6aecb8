//! The ingestion pipeline: framing, parsing, windowing, and snapshot
//! production.
//!
//! Two tasks share the window buffers and nothing else:
//!
//! - the **ingest task** runs the poll loop (byte source → [`LineFramer`] →
//!   [`parse_line`] → window push), bounded work per iteration so it can
//!   never starve the timer;
//! - the **snapshot task** ticks on a fixed interval and publishes an
//!   immutable [`Snapshot`] through a watch channel. Latest wins: a slow
//!   consumer simply observes the next tick instead of a backlog.
//!
//! Malformed lines are dropped and counted, never propagated. Only source
//! open failures and streaming I/O failures are fatal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::data::{parse_line, Metric, MetricSeries, ParseOutcome, Reading, Snapshot, WindowBuffer};
use crate::error::SourceError;
use crate::framer::LineFramer;
use crate::source::{ByteSource, SerialSource};

/// Bytes requested from the source per read.
const READ_CHUNK: usize = 256;

/// Lifecycle of the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing assembled yet. Not observable through a handle.
    Idle,
    /// The byte source is being opened. Open failure is fatal and surfaces
    /// to the caller before a handle exists.
    Connecting,
    /// Steady state: the poll loop is consuming the source while snapshots
    /// tick independently.
    Streaming,
    /// The stream ended cleanly (shutdown requested, or a replay capture
    /// was exhausted).
    Closing,
    /// An unrecoverable I/O error occurred; see
    /// [`PipelineHandle::fault`]. The source has been released.
    Faulted,
    /// The ingest path has stopped and the source is released.
    Terminated,
}

impl PipelineState {
    /// Short status label for display.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Connecting => "connecting",
            PipelineState::Streaming => "streaming",
            PipelineState::Closing => "closing",
            PipelineState::Faulted => "fault",
            PipelineState::Terminated => "ended",
        }
    }

    /// True once the ingest path can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Terminated)
    }
}

/// Counters updated by the ingest task and read by consumers.
#[derive(Debug, Default)]
pub struct IngestStats {
    bytes_read: AtomicU64,
    lines_accepted: AtomicU64,
    lines_skipped: AtomicU64,
    samples: AtomicU64,
}

impl IngestStats {
    /// Raw bytes consumed from the source.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Structurally valid lines, including all-empty records.
    pub fn lines_accepted(&self) -> u64 {
        self.lines_accepted.load(Ordering::Relaxed)
    }

    /// Lines dropped as malformed.
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped.load(Ordering::Relaxed)
    }

    /// Individual samples appended to window buffers.
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }
}

/// Per-metric window buffers shared between the ingest and snapshot tasks.
///
/// Each metric has its own lock, held only for the duration of a single
/// push or a single per-metric copy, never across a whole tick. That gives
/// per-metric atomicity without cross-metric simultaneity, which the
/// sensors (updating at different rates) cannot provide anyway.
#[derive(Debug, Clone)]
pub struct SharedWindows {
    buffers: Arc<[Mutex<WindowBuffer>; Metric::COUNT]>,
}

impl SharedWindows {
    /// Create empty windows, one per metric, each holding `capacity`
    /// samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Arc::new(std::array::from_fn(|_| {
                Mutex::new(WindowBuffer::new(capacity))
            })),
        }
    }

    /// Append one value to one metric's window.
    pub fn push(&self, metric: Metric, value: f64) {
        self.buffers[metric.index()].lock().push(value);
    }

    /// Append every present field of a reading. Returns how many samples
    /// were recorded.
    pub fn record(&self, reading: &Reading) -> usize {
        let mut pushed = 0;
        for (metric, value) in reading.present() {
            self.push(metric, value);
            pushed += 1;
        }
        pushed
    }

    /// Current sample count for one metric.
    pub fn len(&self, metric: Metric) -> usize {
        self.buffers[metric.index()].lock().len()
    }

    /// Materialize an immutable view of all windows.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(std::array::from_fn(|i| {
            let buffer = self.buffers[i].lock();
            MetricSeries::from_values(buffer.to_vec())
        }))
    }
}

/// An assembled but not yet running pipeline.
pub struct Pipeline {
    source: Box<dyn ByteSource>,
    window_capacity: usize,
    tick_period: Duration,
    poll_interval: Duration,
    max_line_len: usize,
}

impl Pipeline {
    /// Assemble a pipeline over an already-open byte source.
    pub fn new(source: Box<dyn ByteSource>, config: &MonitorConfig) -> Self {
        Self {
            source,
            window_capacity: config.window_capacity,
            tick_period: config.tick_period(),
            poll_interval: config.poll_interval(),
            max_line_len: config.max_line_len,
        }
    }

    /// Open the configured serial port and assemble a pipeline over it.
    ///
    /// This is the `Connecting` phase: failure here is fatal and the
    /// pipeline never starts streaming.
    pub fn open_serial(config: &MonitorConfig) -> Result<Self, SourceError> {
        let port = config.port.as_deref().ok_or_else(|| SourceError::Open {
            port: "<unset>".to_string(),
            source: serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                "no serial port configured",
            ),
        })?;
        let source = SerialSource::open(port, config.baud_rate, config.read_timeout())?;
        Ok(Self::new(Box::new(source), config))
    }

    /// Spawn the ingest and snapshot tasks. Must be called within a tokio
    /// runtime.
    pub fn spawn(self) -> PipelineHandle {
        let windows = SharedWindows::new(self.window_capacity);
        let stats = Arc::new(IngestStats::default());
        let fault = Arc::new(Mutex::new(None));
        let description = self.source.description().to_string();

        let (state_tx, state_rx) = watch::channel(PipelineState::Connecting);
        let (snap_tx, snap_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ingest = tokio::spawn(run_ingest(
            self.source,
            windows.clone(),
            stats.clone(),
            fault.clone(),
            state_tx,
            shutdown_rx.clone(),
            self.poll_interval,
            self.max_line_len,
        ));

        let snapshots = tokio::spawn(run_snapshots(
            windows.clone(),
            snap_tx,
            self.tick_period,
            shutdown_rx,
        ));

        PipelineHandle {
            windows,
            snapshots: snap_rx,
            state: state_rx,
            fault,
            stats,
            shutdown: shutdown_tx,
            tasks: vec![ingest, snapshots],
            description,
        }
    }
}

/// Handle to a running pipeline.
///
/// Dropping the handle does not stop the tasks; call
/// [`shutdown`](Self::shutdown) (and [`join`](Self::join) if you need the
/// tasks to have fully exited).
pub struct PipelineHandle {
    windows: SharedWindows,
    snapshots: watch::Receiver<Option<Snapshot>>,
    state: watch::Receiver<PipelineState>,
    fault: Arc<Mutex<Option<String>>>,
    stats: Arc<IngestStats>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    description: String,
}

impl PipelineHandle {
    /// Subscribe to published snapshots. The receiver always holds the
    /// latest snapshot; intermediate ones are never queued.
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot, if any tick has fired.
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Materialize a snapshot immediately, bypassing the tick cadence.
    pub fn snapshot_now(&self) -> Snapshot {
        self.windows.snapshot()
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Wait until the ingest path reaches a terminal state.
    pub async fn wait_terminated(&self) -> PipelineState {
        let mut rx = self.state.clone();
        loop {
            let state = *rx.borrow_and_update();
            if state.is_terminal() {
                return state;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    /// Description of the fault that stopped streaming, if one occurred.
    pub fn fault(&self) -> Option<String> {
        self.fault.lock().clone()
    }

    /// Ingestion counters.
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Description of the underlying byte source.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Signal both tasks to stop. The ingest task releases the byte source
    /// on its way out.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Wait for the spawned tasks to exit.
    pub async fn join(&mut self) {
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

/// The poll loop: source bytes → framer → parser → windows.
#[allow(clippy::too_many_arguments)]
async fn run_ingest(
    mut source: Box<dyn ByteSource>,
    windows: SharedWindows,
    stats: Arc<IngestStats>,
    fault: Arc<Mutex<Option<String>>>,
    state_tx: watch::Sender<PipelineState>,
    mut shutdown_rx: watch::Receiver<bool>,
    poll_interval: Duration,
    max_line_len: usize,
) {
    let mut framer = LineFramer::with_max_line(max_line_len);
    let mut chunk = vec![0u8; READ_CHUNK];

    state_tx.send_replace(PipelineState::Streaming);
    info!(source = source.description(), "streaming started");

    let end_state = loop {
        if *shutdown_rx.borrow() {
            break PipelineState::Closing;
        }

        match source.bytes_available() {
            Ok(0) => {
                // Transient gap: nothing waiting. Sleep until the next poll
                // or a shutdown signal, whichever comes first. A dropped
                // handle counts as shutdown.
                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break PipelineState::Closing;
                        }
                    }
                }
            }
            Ok(_) => match source.read_chunk(&mut chunk) {
                Ok(0) => {
                    tokio::task::yield_now().await;
                }
                Ok(n) => {
                    stats.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
                    ingest_chunk(&chunk[..n], &mut framer, &windows, &stats);
                    // One chunk per iteration keeps the work bounded; yield
                    // so the snapshot timer always gets a turn.
                    tokio::task::yield_now().await;
                }
                Err(SourceError::Closed) => {
                    info!("byte source closed");
                    break PipelineState::Closing;
                }
                Err(e) => {
                    error!(error = %e, "unrecoverable source error");
                    *fault.lock() = Some(e.to_string());
                    break PipelineState::Faulted;
                }
            },
            Err(SourceError::Closed) => {
                info!("byte source closed");
                break PipelineState::Closing;
            }
            Err(e) => {
                error!(error = %e, "unrecoverable source error");
                *fault.lock() = Some(e.to_string());
                break PipelineState::Faulted;
            }
        }
    };

    state_tx.send_replace(end_state);

    // Release the byte source on every exit path.
    drop(source);
    state_tx.send_replace(PipelineState::Terminated);
}

/// Frame and parse one chunk, pushing accepted samples into the windows.
fn ingest_chunk(
    chunk: &[u8],
    framer: &mut LineFramer,
    windows: &SharedWindows,
    stats: &IngestStats,
) {
    for line in framer.push_chunk(chunk) {
        match parse_line(&line) {
            ParseOutcome::Reading(reading) => {
                let pushed = windows.record(&reading);
                stats.lines_accepted.fetch_add(1, Ordering::Relaxed);
                stats.samples.fetch_add(pushed as u64, Ordering::Relaxed);
            }
            ParseOutcome::Blank => {
                stats.lines_accepted.fetch_add(1, Ordering::Relaxed);
            }
            ParseOutcome::Skip => {
                stats.lines_skipped.fetch_add(1, Ordering::Relaxed);
                debug!(line = %line, "dropped malformed line");
            }
        }
    }
}

/// The timer task: materialize and publish a snapshot each tick.
async fn run_snapshots(
    windows: SharedWindows,
    snap_tx: watch::Sender<Option<Snapshot>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                snap_tx.send_replace(Some(windows.snapshot()));
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            window_capacity: 16,
            tick_period_ms: 10,
            poll_interval_ms: 1,
            ..MonitorConfig::default()
        }
    }

    /// A source that reports bytes waiting but fails every read.
    #[derive(Debug)]
    struct BrokenSource;

    impl ByteSource for BrokenSource {
        fn bytes_available(&mut self) -> Result<usize, SourceError> {
            Ok(64)
        }

        fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<usize, SourceError> {
            Err(SourceError::Io(std::io::Error::other("device unplugged")))
        }

        fn description(&self) -> &str {
            "broken"
        }
    }

    /// A source that never has anything to say.
    #[derive(Debug)]
    struct IdleSource;

    impl ByteSource for IdleSource {
        fn bytes_available(&mut self) -> Result<usize, SourceError> {
            Ok(0)
        }

        fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<usize, SourceError> {
            Ok(0)
        }

        fn description(&self) -> &str {
            "idle"
        }
    }

    #[test]
    fn test_shared_windows_snapshot_consistency() {
        let windows = SharedWindows::new(8);
        windows.push(Metric::Pm25, 1.0);
        windows.push(Metric::Pm25, 2.0);
        windows.push(Metric::Pm25, 3.0);

        let snapshot = windows.snapshot();
        let series = snapshot.metric(Metric::Pm25).unwrap();
        assert_eq!(series.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.min, 1.0);
        assert_eq!(series.max, 3.0);

        // A push after the snapshot was taken must not appear in it.
        windows.push(Metric::Pm25, 4.0);
        assert_eq!(
            snapshot.metric(Metric::Pm25).unwrap().values,
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_idempotent_re_snapshot() {
        let windows = SharedWindows::new(8);
        windows.push(Metric::Co2, 410.0);
        windows.push(Metric::Humidity, 45.0);

        let first = windows.snapshot();
        let second = windows.snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn test_record_partial_reading() {
        let windows = SharedWindows::new(8);
        let reading = match parse_line(",415,,") {
            ParseOutcome::Reading(r) => r,
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(windows.record(&reading), 1);
        assert_eq!(windows.len(Metric::Co2), 1);
        assert_eq!(windows.len(Metric::Pm25), 0);
        assert_eq!(windows.len(Metric::Temperature), 0);
        assert_eq!(windows.len(Metric::Humidity), 0);
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let capture = "12.3,410,21.5,45.0\n#note\n\n13.1,,22.0,\nbad,line\n";
        let source = ReplaySource::from_bytes(capture.as_bytes().to_vec(), "fixture");

        let handle = Pipeline::new(Box::new(source), &test_config()).spawn();
        let end = handle.wait_terminated().await;
        assert_eq!(end, PipelineState::Terminated);
        assert!(handle.fault().is_none());

        let snapshot = handle.snapshot_now();
        assert_eq!(
            snapshot.metric(Metric::Pm25).unwrap().values,
            vec![12.3, 13.1]
        );
        assert_eq!(snapshot.metric(Metric::Co2).unwrap().values, vec![410.0]);
        assert_eq!(
            snapshot.metric(Metric::Temperature).unwrap().values,
            vec![21.5, 22.0]
        );
        assert_eq!(
            snapshot.metric(Metric::Humidity).unwrap().values,
            vec![45.0]
        );

        // Comment and blank lines are filtered at the framing level and
        // counted nowhere; only "bad,line" is a skip.
        assert_eq!(handle.stats().lines_accepted(), 2);
        assert_eq!(handle.stats().lines_skipped(), 1);
        assert_eq!(handle.stats().samples(), 6);
    }

    #[tokio::test]
    async fn test_pipeline_publishes_snapshots_on_tick() {
        let capture = b"1,2,3,4\n".to_vec();
        let source = ReplaySource::from_bytes(capture, "tick");

        let handle = Pipeline::new(Box::new(source), &test_config()).spawn();
        let mut rx = handle.subscribe();

        let snapshot = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.expect("snapshot task alive");
                let latest = rx.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    if !snapshot.is_empty() {
                        return snapshot;
                    }
                }
            }
        })
        .await
        .expect("snapshot within deadline");

        assert_eq!(snapshot.metric(Metric::Pm25).unwrap().values, vec![1.0]);
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_pipeline_faults_on_io_error() {
        let handle = Pipeline::new(Box::new(BrokenSource), &test_config()).spawn();

        let end = handle.wait_terminated().await;
        assert_eq!(end, PipelineState::Terminated);
        let fault = handle.fault().expect("fault recorded");
        assert!(fault.contains("device unplugged"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_pipeline() {
        let mut handle = Pipeline::new(Box::new(IdleSource), &test_config()).spawn();
        assert!(handle.fault().is_none());

        handle.shutdown();
        let end = handle.wait_terminated().await;
        assert_eq!(end, PipelineState::Terminated);
        handle.join().await;
    }
}
