use super::{run_job, Job, JobContext, JobReply};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Outcome of one job inside a refresh
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub path: &'static str,
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<JobReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    /// True only if every job succeeded
    pub ok: bool,
    pub run_id: Uuid,
    pub results: Vec<JobReport>,
}

/// Run events, participants, odds and cleanup in that order.
///
/// A failing job is recorded and the sequence continues; this never errors.
pub async fn run(ctx: &JobContext, now: DateTime<Utc>, force_cleanup: bool) -> RefreshReport {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("refresh", %run_id);

    async move {
        let mut results = Vec::with_capacity(Job::REFRESH_ORDER.len());

        for job in Job::REFRESH_ORDER {
            let report = match run_job(ctx, job, now, force_cleanup).await {
                Ok(summary) => JobReport {
                    path: job.path(),
                    ok: true,
                    status: 200,
                    body: Some(summary.into()),
                    error: None,
                },
                Err(e) => {
                    error!("{} failed: {}", job.path(), e);
                    JobReport {
                        path: job.path(),
                        ok: false,
                        status: e.status_code().as_u16(),
                        body: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(report);
        }

        let ok = results.iter().all(|r| r.ok);
        info!(
            "Refresh finished: {}/{} jobs ok",
            results.iter().filter(|r| r.ok).count(),
            results.len()
        );

        RefreshReport { ok, run_id, results }
    }
    .instrument(span)
    .await
}
