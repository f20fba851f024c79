//! Daily scheduler commands.

use super::{AppContext, Render};
use crate::cli::ScheduleArgs;
use crate::error::AppError;
use crate::models::config::{parse_send_time, validate_letter_count};
use crate::models::{AppConfig, LetterRequest};
use crate::services::courier::{Courier, DeliveryReport};
use crate::services::scheduler::{
    next_occurrence, ScheduledJob, Scheduler, SchedulerConfig, SchedulerStatus,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::future::Future;

/// Response for `schedule next`.
#[derive(Debug, Serialize)]
pub struct NextRunResponse {
    /// Next run, local time.
    pub next_run: NaiveDateTime,
    pub letters_per_day: u32,
    pub theme: String,
}

impl Render for NextRunResponse {
    fn render(&self) -> String {
        format!(
            "Next run: {} ({} '{}' letter(s))",
            self.next_run.format("%Y-%m-%d %H:%M"),
            self.letters_per_day,
            self.theme
        )
    }
}

impl Render for SchedulerStatus {
    fn render(&self) -> String {
        let mut out = format!("Scheduler stopped after {} run(s)", self.runs);
        if let Some(last_run) = self.last_run {
            out.push_str(&format!("\nLast run: {}", last_run.format("%Y-%m-%d %H:%M:%S")));
        }
        if let Some(error) = &self.last_error {
            out.push_str(&format!("\nLast error: {}", error));
        }
        out
    }
}

/// Job that sends letters using the config file as it is at run time, so
/// edits made while the scheduler runs take effect on the next run.
#[derive(Debug, Clone)]
pub struct ConfiguredSend {
    ctx: AppContext,
}

impl ConfiguredSend {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

impl ScheduledJob for ConfiguredSend {
    fn run(
        &self,
        config: SchedulerConfig,
    ) -> impl Future<Output = Result<DeliveryReport, AppError>> + Send {
        let ctx = self.ctx.clone();
        async move {
            let app_config = ctx.load_config()?;
            let token = ctx.require_token(&app_config)?;
            let pool = ctx.open_db().await?;
            let courier = Courier::from_config(&app_config, &token, pool)?;

            let request = LetterRequest::new("", config.theme, config.emoji);
            courier.send_letters(&request, config.letters_per_day).await
        }
    }
}

/// Merge command line options over the config file.
pub fn scheduler_config(config: &AppConfig, args: &ScheduleArgs) -> Result<SchedulerConfig, AppError> {
    let send_time = match &args.at {
        Some(at) => parse_send_time(at)?,
        None => config.send_time()?,
    };

    Ok(SchedulerConfig {
        send_time,
        letters_per_day: validate_letter_count(args.count.unwrap_or(config.letters_per_day))?,
        theme: args.theme.clone().unwrap_or_else(|| config.theme.clone()),
        emoji: args.emoji.clone().unwrap_or_else(|| config.emoji.clone()),
    })
}

/// Print when the next run would happen.
pub fn next(ctx: &AppContext, args: ScheduleArgs) -> Result<NextRunResponse, AppError> {
    let config = ctx.load_config()?;
    let scheduler_config = scheduler_config(&config, &args)?;

    Ok(NextRunResponse {
        next_run: next_occurrence(
            scheduler_config.send_time,
            chrono::Local::now().naive_local(),
        ),
        letters_per_day: scheduler_config.letters_per_day,
        theme: scheduler_config.theme,
    })
}

/// Run the scheduler in the foreground until Ctrl-C.
///
/// The repository, destinations and token are checked once up front so a
/// broken setup fails immediately instead of at the first send time.
pub async fn run(ctx: &AppContext, args: ScheduleArgs) -> Result<SchedulerStatus, AppError> {
    let config = ctx.load_config()?;
    let scheduler_config = scheduler_config(&config, &args)?;
    config.repo_id()?;
    config.destinations()?;
    ctx.require_token(&config)?;

    let handle = Scheduler::start_background(ConfiguredSend::new(ctx.clone()), scheduler_config);

    if args.now {
        handle.trigger_now().await?;
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("[schedule] Failed to listen for Ctrl-C: {}", e);
            }
            log::info!("[schedule] Interrupted, shutting down");
        }
        _ = handle.stopped() => {}
    }

    handle.stop().await;
    Ok(handle.status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_args_override_config() {
        let config = AppConfig {
            send_time: "08:15".into(),
            letters_per_day: 2,
            theme: "poetic".into(),
            ..Default::default()
        };

        let from_config = scheduler_config(&config, &ScheduleArgs::default()).unwrap();
        assert_eq!(from_config.send_time, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
        assert_eq!(from_config.letters_per_day, 2);
        assert_eq!(from_config.theme, "poetic");

        let overridden = scheduler_config(
            &config,
            &ScheduleArgs {
                at: Some("22:00".into()),
                count: Some(4),
                theme: Some("playful".into()),
                emoji: Some("🌙".into()),
                now: false,
            },
        )
        .unwrap();
        assert_eq!(overridden.send_time, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(overridden.letters_per_day, 4);
        assert_eq!(overridden.theme, "playful");
        assert_eq!(overridden.emoji, "🌙");
    }

    #[test]
    fn test_invalid_args_rejected() {
        let config = AppConfig::default();
        let bad_time = ScheduleArgs {
            at: Some("25:00".into()),
            ..Default::default()
        };
        assert!(scheduler_config(&config, &bad_time).is_err());

        let bad_count = ScheduleArgs {
            count: Some(0),
            ..Default::default()
        };
        assert!(scheduler_config(&config, &bad_count).is_err());
    }

    #[test]
    fn test_render_status() {
        let status = SchedulerStatus {
            runs: 2,
            last_error: Some("1 of 2 deliveries failed".into()),
            ..Default::default()
        };
        let text = status.render();
        assert!(text.starts_with("Scheduler stopped after 2 run(s)"));
        assert!(text.contains("Last error: 1 of 2 deliveries failed"));
    }
}
