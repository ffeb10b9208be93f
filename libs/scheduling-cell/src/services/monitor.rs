use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use shared_config::SchedulingConfig;

use crate::models::{CalendarDay, QueueClassification};
use crate::services::clock::Clock;
use crate::services::queue::QueueClassifier;
use crate::services::source::AppointmentSource;

#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub doctor_id: String,
    pub taken_at: NaiveDateTime,
    pub classification: QueueClassification,
}

impl QueueSnapshot {
    /// Id of the appointment being served (or due next).
    pub fn now_serving(&self) -> Option<&str> {
        self.classification.active().map(|entry| entry.id.as_str())
    }
}

/// Keeps one doctor's waiting-room display current by re-classifying the
/// day's queue on a fixed interval.
pub struct LiveQueueMonitor {
    doctor_id: String,
    source: Arc<dyn AppointmentSource>,
    clock: Arc<dyn Clock>,
    classifier: QueueClassifier,
    refresh_interval: Duration,
}

impl LiveQueueMonitor {
    pub fn new(
        doctor_id: impl Into<String>,
        source: Arc<dyn AppointmentSource>,
        clock: Arc<dyn Clock>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            source,
            clock,
            classifier: QueueClassifier::new(config),
            refresh_interval: config.queue_refresh_interval(),
        }
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// One tick: read the clock, fetch that day's queue and classify it.
    pub async fn refresh(&self) -> Result<QueueSnapshot> {
        let now = self.clock.now();
        let today = CalendarDay::of(now);

        let appointments = self
            .source
            .approved_appointments(&self.doctor_id, today.date())
            .await?;
        let classification = self.classifier.classify(&appointments, now);

        Ok(QueueSnapshot {
            doctor_id: self.doctor_id.clone(),
            taken_at: now,
            classification,
        })
    }

    /// Runs the monitor on its own task until the returned handle is
    /// stopped or dropped.
    pub fn spawn(self) -> LiveQueueHandle {
        let doctor_id = self.doctor_id.clone();
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(self.run(snapshot_tx, shutdown_rx));

        LiveQueueHandle {
            doctor_id,
            snapshots: snapshot_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    #[instrument(skip_all, fields(doctor_id = %self.doctor_id))]
    async fn run(
        self,
        snapshot_tx: watch::Sender<Option<QueueSnapshot>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("Live queue monitor started (every {:?})", self.refresh_interval);

        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut serving: Option<String> = None;

        loop {
            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.refresh().await {
                        Ok(snapshot) => {
                            let now_serving = snapshot.now_serving().map(str::to_string);
                            if now_serving != serving {
                                info!("Now serving {:?}", now_serving);
                                serving = now_serving;
                            } else {
                                debug!("Queue refreshed at {}", snapshot.taken_at);
                            }
                            snapshot_tx.send_replace(Some(snapshot));
                        }
                        Err(e) => {
                            warn!("Queue refresh failed, keeping previous snapshot: {}", e);
                        }
                    }
                }
            }
        }

        info!("Live queue monitor stopped");
    }
}

pub struct LiveQueueHandle {
    doctor_id: String,
    snapshots: watch::Receiver<Option<QueueSnapshot>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LiveQueueHandle {
    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<QueueSnapshot>> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> Option<QueueSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Signals the monitor and waits for its task to finish.
    pub async fn stop(mut self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Live queue monitor for {} ended abnormally: {}", self.doctor_id, e);
            }
        }
    }
}

impl Drop for LiveQueueHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
