// Long-running job endpoints
//
// commit, log and report submit work that the server may finish later.
// When the submit response names a job, the client polls it until the
// job reports FIN, the caller's timeout passes, or a check fails.

use tokio::time::Instant;
use tracing::debug;

use crate::error::Error;
use crate::poll::{Check, Completion, JobPoll, PollSettings, NO_CHANGES_TO_COMMIT};
use crate::response::Response;
use crate::transport::{ApiRequest, Transport};
use crate::xapi::client::XapiClient;
use crate::xapi::op::cmd_xml;

/// How the status of a job is checked on each poll.
#[derive(Debug, Clone)]
pub enum JobCheck {
    /// `type=<api_type>&action=get&job-id=<id>`, used for log and
    /// report jobs.
    ActionGet { api_type: String },
    /// `type=op` with `show jobs id "<id>"`, used for commit jobs.
    ShowJobs,
    /// Resubmit this request until the server answers that there are no
    /// changes to commit. For servers without job status queries.
    Resubmit(ApiRequest),
}

impl JobCheck {
    pub fn action_get(api_type: impl Into<String>) -> Self {
        Self::ActionGet {
            api_type: api_type.into(),
        }
    }

    fn completion(&self) -> Completion {
        match self {
            Self::ActionGet { .. } | Self::ShowJobs => Completion::JobStatus,
            Self::Resubmit(_) => Completion::NoChangesMessage,
        }
    }
}

/// Parameters for `type=commit`.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    /// `<commit>` document; `None` commits the whole candidate config.
    pub cmd: Option<String>,
    /// e.g. `all` for a Panorama commit-all.
    pub action: Option<String>,
    /// Wait for the commit job to finish.
    pub sync: bool,
    /// Poll by resubmitting the commit instead of querying the job.
    pub legacy_poll: bool,
    /// Seconds between checks; 0.5 when unset.
    pub interval: Option<f64>,
    /// Seconds before giving up; unset or zero waits forever.
    pub timeout: Option<f64>,
}

/// Parameters for `type=log`.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub log_type: Option<String>,
    pub nlogs: Option<u32>,
    pub skip: Option<u32>,
    /// Log filter expression, sent as `query=`.
    pub filter: Option<String>,
    /// `forward` or `backward`.
    pub direction: Option<String>,
    pub interval: Option<f64>,
    pub timeout: Option<f64>,
}

/// Parameters for `type=report`.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    /// `dynamic`, `predefined` or `custom`.
    pub report_type: Option<String>,
    pub report_name: Option<String>,
    pub vsys: Option<String>,
    pub cmd: Option<String>,
    /// Further pairs, e.g. `period=last-24-hrs` or `topn=10`.
    pub extra: Vec<(String, String)>,
    pub interval: Option<f64>,
    pub timeout: Option<f64>,
}

impl<T: Transport> XapiClient<T> {
    /// Commit the candidate configuration.
    ///
    /// Returns the commit job id when the server queued one. With
    /// `sync`, waits for that job before returning.
    pub async fn commit(&mut self, commit: &CommitRequest) -> Result<Option<String>, Error> {
        let settings = self.poll_settings(commit.interval, commit.timeout)?;

        let mut request = self.authed_request("commit").await?;
        request.push_opt("cmd", commit.cmd.as_deref());
        request.push_opt("action", commit.action.as_deref());

        self.execute(&request).await?;
        let job_id = self.response.job_id().map(String::from);

        if !commit.sync {
            return Ok(job_id);
        }

        if commit.legacy_poll {
            if self.response.status_detail() == Some(NO_CHANGES_TO_COMMIT) {
                return Ok(job_id);
            }
            let label = job_id.clone().unwrap_or_else(|| "commit".to_owned());
            debug!(job = %label, "commit submitted, resubmitting until no changes remain");
            self.wait_for_job(&label, &JobCheck::Resubmit(request), settings)
                .await?;
            return Ok(job_id);
        }

        let Some(job) = job_id else {
            return Ok(None);
        };
        debug!(job = %job, "commit job queued");
        self.wait_for_job(&job, &JobCheck::ShowJobs, settings).await?;
        Ok(Some(job))
    }

    /// Retrieve logs. The server queues a log job; this waits for it and
    /// leaves the finished job's `result/log/logs` in the last response.
    pub async fn log(&mut self, query: &LogQuery) -> Result<Option<String>, Error> {
        let settings = self.poll_settings(query.interval, query.timeout)?;

        let mut request = self.authed_request("log").await?;
        request.push_opt("log-type", query.log_type.as_deref());
        request.push_opt("nlogs", query.nlogs.map(|n| n.to_string()).as_deref());
        request.push_opt("skip", query.skip.map(|n| n.to_string()).as_deref());
        request.push_opt("query", query.filter.as_deref());
        request.push_opt("dir", query.direction.as_deref());

        self.execute(&request).await?;
        self.follow_job(JobCheck::action_get("log"), settings).await
    }

    /// Generate a report. Dynamic reports are produced as jobs and
    /// fetched with `type=report&action=get` once finished.
    pub async fn report(&mut self, query: &ReportQuery) -> Result<Option<String>, Error> {
        let settings = self.poll_settings(query.interval, query.timeout)?;

        let mut request = self.authed_request("report").await?;
        request.push_opt("reporttype", query.report_type.as_deref());
        request.push_opt("reportname", query.report_name.as_deref());
        request.push_opt("vsys", query.vsys.as_deref());
        request.push_opt("cmd", query.cmd.as_deref());
        for (name, value) in &query.extra {
            request.push(name, value.as_str());
        }

        self.execute(&request).await?;
        self.follow_job(JobCheck::action_get("report"), settings).await
    }

    /// Validate poll settings. A rejected call still clears the
    /// previous response.
    fn poll_settings(
        &mut self,
        interval: Option<f64>,
        timeout: Option<f64>,
    ) -> Result<PollSettings, Error> {
        PollSettings::new(interval, timeout).inspect_err(|err| {
            self.response = Response::default();
            self.response.status_detail = Some(err.to_string());
        })
    }

    /// Poll the job named in the last response, if any.
    async fn follow_job(
        &mut self,
        check: JobCheck,
        settings: PollSettings,
    ) -> Result<Option<String>, Error> {
        let Some(job) = self.response.job_id().map(String::from) else {
            debug!("no job in response, result delivered inline");
            return Ok(None);
        };
        self.wait_for_job(&job, &check, settings).await?;
        Ok(Some(job))
    }

    /// Poll `job_id` until it finishes.
    ///
    /// Each iteration sleeps one interval, then checks. The loop ends on
    /// completion, on the first failed check, or once a check finds the
    /// job still running after the timeout has passed. The last status
    /// response stays in [`last_response`](Self::last_response).
    pub async fn wait_for_job(
        &mut self,
        job_id: &str,
        check: &JobCheck,
        settings: PollSettings,
    ) -> Result<(), Error> {
        let request = self.status_request(job_id, check).await?;
        let completion = check.completion();
        let mut poll = JobPoll::new(job_id, settings);
        let start = Instant::now();

        loop {
            tokio::time::sleep(settings.interval()).await;

            let outcome = self.execute(&request).await;
            let check = match (outcome, self.response.root()) {
                (Ok(()) | Err(Error::Api { .. }), Some(root)) => completion.evaluate(
                    root,
                    self.response.is_success(),
                    self.response.status_detail(),
                    job_id,
                ),
                (Err(err), _) => Check::Failed(err),
                (Ok(()), None) => Check::Failed(Error::Protocol {
                    message: format!("job {job_id} status response is not XML"),
                }),
            };

            if let Check::Pending(status) = &check {
                debug!(job_id, status = ?status, checks = poll.checks() + 1, "job not finished");
            }

            let state = poll.tick(check, start.elapsed());
            if state.is_terminal() {
                debug!(job_id, checks = poll.checks(), ?state, "job polling finished");
                return poll.finish(state);
            }
        }
    }

    async fn status_request(&mut self, job_id: &str, check: &JobCheck) -> Result<ApiRequest, Error> {
        match check {
            JobCheck::ActionGet { api_type } => {
                let mut request = self.authed_request(api_type).await?;
                request.push("action", "get");
                request.push("job-id", job_id);
                Ok(request)
            }
            JobCheck::ShowJobs => {
                let mut request = self.authed_request("op").await?;
                request.push("cmd", cmd_xml(&format!("show jobs id \"{job_id}\"")));
                Ok(request)
            }
            JobCheck::Resubmit(request) => Ok(request.clone()),
        }
    }
}
