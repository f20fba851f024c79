//! Daily send scheduler.
//!
//! A background task wakes once per minute and checks whether today's send
//! time has passed. When it has, the job runs once and the next run moves to
//! the following day. The task is controlled through a [`SchedulerHandle`].

use crate::error::AppError;
use crate::services::courier::DeliveryReport;
use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How often the loop checks whether a run is due.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// What the scheduled job sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerConfig {
    /// Local time of day to send.
    pub send_time: NaiveTime,

    /// Letters per run.
    pub letters_per_day: u32,

    /// Theme used for scheduled letters.
    pub theme: String,

    /// Emoji appended to scheduled letters.
    pub emoji: String,
}

/// Work performed at each scheduled run.
pub trait ScheduledJob: Send + Sync + 'static {
    fn run(
        &self,
        config: SchedulerConfig,
    ) -> impl Future<Output = Result<DeliveryReport, AppError>> + Send;
}

/// Next-run bookkeeping for a once-a-day job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    next_run: NaiveDateTime,
}

impl DailySchedule {
    /// Schedule starting at `now`: today if the time is still ahead,
    /// otherwise tomorrow.
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            at,
            next_run: next_occurrence(at, now),
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Move the next run to the first occurrence strictly after `now`.
    pub fn mark_ran(&mut self, now: NaiveDateTime) {
        self.next_run = next_occurrence(self.at, now);
    }
}

/// First time-of-day `at` strictly after `now`.
pub fn next_occurrence(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Status of the scheduler loop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStatus {
    /// Whether a send is in progress.
    pub is_sending: bool,

    /// Next scheduled run (local time).
    pub next_run: Option<NaiveDateTime>,

    /// Last run (local time).
    pub last_run: Option<NaiveDateTime>,

    /// Error of the last run, if it failed.
    pub last_error: Option<String>,

    /// Number of runs so far, scheduled or triggered.
    pub runs: u64,
}

/// Commands that can be sent to the scheduler loop.
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run the job immediately, leaving the daily schedule untouched.
    TriggerNow,

    /// Replace the configuration and recompute the next run.
    UpdateConfig(SchedulerConfig),
}

/// Lightweight handle for controlling the background scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    config: Arc<RwLock<SchedulerConfig>>,
    status: Arc<RwLock<SchedulerStatus>>,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SchedulerHandle {
    /// Run the job now.
    pub async fn trigger_now(&self) -> Result<(), AppError> {
        self.command_tx
            .send(SchedulerCommand::TriggerNow)
            .await
            .map_err(|_| AppError::scheduler("Scheduler not running"))
    }

    /// Update the configuration.
    pub async fn update_config(&self, config: SchedulerConfig) -> Result<(), AppError> {
        self.command_tx
            .send(SchedulerCommand::UpdateConfig(config))
            .await
            .map_err(|_| AppError::scheduler("Scheduler not running"))
    }

    /// Get the current configuration.
    pub async fn get_config(&self) -> SchedulerConfig {
        self.config.read().await.clone()
    }

    /// Get a snapshot of the loop status.
    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Stop the loop and wait for it to exit. A send in progress finishes
    /// first.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                log::error!("[scheduler] Task ended abnormally: {}", e);
            }
        }
    }

    /// Resolve once the loop has been asked to stop.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }
}

/// Background scheduler.
pub struct Scheduler<J: ScheduledJob> {
    job: J,
    config: Arc<RwLock<SchedulerConfig>>,
    status: Arc<RwLock<SchedulerStatus>>,
}

impl<J: ScheduledJob> Scheduler<J> {
    /// Start the background loop and return a handle to it.
    pub fn start_background(job: J, config: SchedulerConfig) -> SchedulerHandle {
        let (tx, rx) = mpsc::channel::<SchedulerCommand>(16);
        let config_shared = Arc::new(RwLock::new(config));
        let status_shared = Arc::new(RwLock::new(SchedulerStatus::default()));
        let cancel = CancellationToken::new();

        let scheduler = Scheduler {
            job,
            config: config_shared.clone(),
            status: status_shared.clone(),
        };
        let task = tokio::spawn(scheduler.run_loop(rx, cancel.clone()));

        SchedulerHandle {
            command_tx: tx,
            config: config_shared,
            status: status_shared,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run_loop(self, mut rx: mpsc::Receiver<SchedulerCommand>, cancel: CancellationToken) {
        let send_time = self.config.read().await.send_time;
        let mut schedule = DailySchedule::new(send_time, local_now());
        self.status.write().await.next_run = Some(schedule.next_run());
        log::info!("[scheduler] Started, next run at {}", schedule.next_run());

        let mut interval = time::interval(CHECK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("[scheduler] Stopping");
                    break;
                }
                _ = interval.tick() => {
                    let now = local_now();
                    if schedule.is_due(now) {
                        log::info!("[scheduler] Daily run due ({})", schedule.next_run());
                        self.run_once().await;
                        schedule.mark_ran(local_now());
                        self.status.write().await.next_run = Some(schedule.next_run());
                        log::info!("[scheduler] Next run at {}", schedule.next_run());
                    }
                }
                Some(cmd) = rx.recv() => {
                    match cmd {
                        SchedulerCommand::TriggerNow => {
                            log::info!("[scheduler] Manual run triggered");
                            self.run_once().await;
                        }
                        SchedulerCommand::UpdateConfig(new_config) => {
                            schedule = DailySchedule::new(new_config.send_time, local_now());
                            log::info!(
                                "[scheduler] Config updated, next run at {}",
                                schedule.next_run()
                            );
                            *self.config.write().await = new_config;
                            self.status.write().await.next_run = Some(schedule.next_run());
                        }
                    }
                }
            }
        }

        cancel.cancel();
        log::info!("[scheduler] Stopped");
    }

    /// Run the job once and record the outcome in the status.
    async fn run_once(&self) {
        self.status.write().await.is_sending = true;

        let config = self.config.read().await.clone();
        let result = self.job.run(config).await;

        let mut status = self.status.write().await;
        status.is_sending = false;
        status.last_run = Some(local_now());
        status.runs += 1;
        status.last_error = match result {
            Ok(report) if report.is_success() => {
                log::info!(
                    "[scheduler] Run complete: {} delivered",
                    report.delivered.len()
                );
                None
            }
            Ok(report) => {
                let message = format!(
                    "{} of {} deliveries failed",
                    report.failed.len(),
                    report.failed.len() + report.delivered.len()
                );
                log::warn!("[scheduler] Run finished with failures: {}", message);
                Some(message)
            }
            Err(e) => {
                log::error!("[scheduler] Run failed: {}", e);
                Some(e.to_string())
            }
        };
    }
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
