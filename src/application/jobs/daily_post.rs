//! Cron job that runs the daily rotation cycle.

use std::{str::FromStr, sync::Arc};

use apalis::prelude::*;
use apalis_cron::Schedule;

use crate::application::{
    jobs::job_failed,
    rotation::{RotationOutcome, RotationService},
};

/// Marker struct for the cron-triggered rotation job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct DailyPostJob;

impl From<chrono::DateTime<chrono::Utc>> for DailyPostJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct DailyPostContext {
    pub rotation: Arc<RotationService>,
}

/// Run one rotation cycle. Only a failed database read or commit fails the job.
pub async fn process_daily_post_job(
    _job: DailyPostJob,
    ctx: Data<DailyPostContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.rotation.run_daily_cycle().await {
        Ok(RotationOutcome::NothingToPost {
            category_id,
            reason,
        }) => {
            tracing::info!(category_id, reason = reason.as_str(), "No tips available");
            Ok(())
        }
        Ok(RotationOutcome::Attempted(report)) => {
            if report.posted {
                tracing::info!(
                    tip_id = report.tip.id,
                    external_id = report.external_id.as_deref().unwrap_or(""),
                    "Daily tip posted"
                );
            } else {
                tracing::warn!(tip_id = report.tip.id, "Daily tip could not be published");
            }
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "Daily rotation cycle failed");
            Err(job_failed(err))
        }
    }
}

/// Parse the six-field cron expression (seconds first) that drives the daily cycle.
pub fn daily_post_schedule(expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(expression).map_err(|err| err.to_string())
}
