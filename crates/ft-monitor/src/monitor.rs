use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use ft_core::{Observation, Snapshot, UsageTracker, classify};
use ft_store::UsageStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::MonitorError;
use crate::platform::FocusSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub tick_interval: Duration,
    pub autosave_interval: Duration,
    /// Snapshots held for a slow subscriber before new ones are dropped.
    pub snapshot_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            autosave_interval: Duration::from_secs(60),
            snapshot_buffer: 16,
        }
    }
}

enum Command {
    SaveNow(oneshot::Sender<Result<(), MonitorError>>),
}

pub struct Monitor;

impl Monitor {
    /// Starts the polling task on the current tokio runtime.
    ///
    /// The task first restores today's totals from `store`, then ticks until
    /// [`MonitorHandle::shutdown`] is called or the handle is dropped.
    pub fn spawn<S: FocusSource>(
        config: MonitorConfig,
        source: S,
        store: Arc<UsageStore>,
    ) -> MonitorHandle {
        Self::spawn_with_calendar(config, source, store, || Local::now().date_naive())
    }

    /// Like [`Monitor::spawn`], with `today` deciding the current date.
    pub fn spawn_with_calendar<S, F>(
        config: MonitorConfig,
        source: S,
        store: Arc<UsageStore>,
        today: F,
    ) -> MonitorHandle
    where
        S: FocusSource,
        F: Fn() -> NaiveDate + Send + 'static,
    {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(config.snapshot_buffer.max(1));
        let (command_tx, command_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            source,
            store,
            today: Box::new(today),
            snapshots: snapshot_tx,
            dropped: Arc::clone(&dropped),
        };
        let task = tokio::spawn(worker.run(config, command_rx, cancel.clone()));

        MonitorHandle {
            commands: command_tx,
            snapshots: Some(snapshot_rx),
            dropped,
            cancel,
            task,
        }
    }
}

/// Control side of a running monitor.
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    snapshots: Option<mpsc::Receiver<Snapshot>>,
    dropped: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), MonitorError>>,
}

impl MonitorHandle {
    /// Takes the snapshot receiver. There is exactly one.
    pub fn subscribe(&mut self) -> Result<mpsc::Receiver<Snapshot>, MonitorError> {
        self.snapshots.take().ok_or(MonitorError::AlreadySubscribed)
    }

    /// Persists the current tree now and waits for the write.
    pub async fn save_now(&self) -> Result<(), MonitorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::SaveNow(reply_tx))
            .await
            .map_err(|_| MonitorError::Stopped)?;
        reply_rx.await.map_err(|_| MonitorError::Stopped)?
    }

    /// Snapshots discarded because the subscriber fell behind.
    pub fn dropped_snapshots(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops the task and waits for its final save.
    pub async fn shutdown(self) -> Result<(), MonitorError> {
        self.cancel.cancel();
        self.task.await?
    }
}

struct Worker<S> {
    source: S,
    store: Arc<UsageStore>,
    today: Box<dyn Fn() -> NaiveDate + Send>,
    snapshots: mpsc::Sender<Snapshot>,
    dropped: Arc<AtomicU64>,
}

impl<S: FocusSource> Worker<S> {
    async fn run(
        mut self,
        config: MonitorConfig,
        mut commands: mpsc::Receiver<Command>,
        cancel: CancellationToken,
    ) -> Result<(), MonitorError> {
        let today = (self.today)();
        let mut tracker = restore(&self.store, today).await;

        let start = Instant::now();
        let mut ticker = interval_at(start + config.tick_interval, config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut autosave = interval_at(start + config.autosave_interval, config.autosave_interval);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = start;

        tracing::info!(date = %tracker.date(), apps = tracker.tree().len(), "monitor started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    self.tick(&mut tracker, elapsed);
                }
                _ = autosave.tick() => {
                    if let Err(err) = persist(&self.store, &tracker).await {
                        tracing::warn!(error = %err, "autosave failed");
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::SaveNow(reply)) => {
                        let _ = reply.send(persist(&self.store, &tracker).await);
                    }
                    None => break,
                },
            }
        }

        tracing::info!("monitor stopping");
        persist(&self.store, &tracker).await
    }

    fn tick(&mut self, tracker: &mut UsageTracker, elapsed: Duration) {
        let today = (self.today)();
        let observation = if today == tracker.date() {
            self.observe()
        } else {
            None
        };

        let snapshot = tracker.tick(today, elapsed, observation.as_ref());
        self.publish(snapshot);
    }

    fn observe(&mut self) -> Option<Observation> {
        let foreground = self.source.foreground()?;
        Some(Observation {
            classification: classify(&foreground.process_name, &foreground.title),
            exe_path: foreground.exe_path,
        })
    }

    fn publish(&self, snapshot: Snapshot) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.snapshots.try_send(snapshot) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(dropped, "subscriber lagging, snapshot dropped");
        }
    }
}

async fn restore(store: &Arc<UsageStore>, today: NaiveDate) -> UsageTracker {
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || store.load(today)).await {
        Ok(records) => UsageTracker::restore(today, &records),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load today's usage");
            UsageTracker::new(today)
        }
    }
}

async fn persist(store: &Arc<UsageStore>, tracker: &UsageTracker) -> Result<(), MonitorError> {
    let store = Arc::clone(store);
    let date = tracker.date();
    let records = tracker.tree().to_records();
    tokio::task::spawn_blocking(move || store.save_records(date, records)).await??;
    Ok(())
}
