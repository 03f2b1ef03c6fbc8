// Job polling state machine
//
// Long-running operations (commit, log, report) hand back a job id. The
// poller re-checks the job at a fixed interval until it reports
// completion or the caller's budget runs out. The decision logic lives in
// `JobPoll::tick`, which takes elapsed time as a parameter so it can be
// driven without a clock; `XapiClient::wait_for_job` supplies the sleeps.

use std::time::Duration;

use crate::error::Error;
use crate::xml::Element;

/// Default pause between job status checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Job status text signalling completion.
pub const JOB_FINISHED: &str = "FIN";

/// Message a pre-job-status server returns once a resubmitted commit has
/// nothing left to do. Must match byte for byte.
pub const NO_CHANGES_TO_COMMIT: &str = "There are no changes to commit.";

// ── Settings ─────────────────────────────────────────────────────────

/// Validated interval and timeout for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: None,
        }
    }
}

impl PollSettings {
    /// Validate caller-supplied seconds. `interval` defaults to 0.5s and
    /// must be non-negative; a `timeout` of zero means "no timeout".
    pub fn new(interval: Option<f64>, timeout: Option<f64>) -> Result<Self, Error> {
        let interval = match interval {
            None => DEFAULT_INTERVAL,
            Some(secs) => seconds("interval", secs)?,
        };
        let timeout = match timeout {
            None => None,
            Some(secs) => Some(seconds("timeout", secs)?).filter(|t| !t.is_zero()),
        };
        Ok(Self { interval, timeout })
    }

    /// Parse string inputs, as they arrive from config or a command line.
    pub fn parse(interval: Option<&str>, timeout: Option<&str>) -> Result<Self, Error> {
        let number = |name: &'static str, raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| Error::invalid(name, raw))
        };
        let interval = interval.map(|raw| number("interval", raw)).transpose()?;
        let timeout = timeout.map(|raw| number("timeout", raw)).transpose()?;
        Self::new(interval, timeout)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn seconds(name: &'static str, secs: f64) -> Result<Duration, Error> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(Error::invalid(name, secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| Error::invalid(name, secs))
}

// ── Completion ───────────────────────────────────────────────────────

/// How a status-check response is judged complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// `result/job/status` equals `FIN`.
    JobStatus,
    /// The resubmitted request answers "There are no changes to commit.".
    NoChangesMessage,
}

/// Outcome of one status check, before the timeout is considered.
#[derive(Debug)]
pub enum Check {
    /// The job is still running; carries the server's status text.
    Pending(Option<String>),
    Finished,
    Failed(Error),
}

impl Completion {
    /// Judge a check that produced well-formed XML. `success` is the
    /// interpreter's verdict and `message` its extracted diagnostic.
    pub fn evaluate(
        self,
        root: &Element,
        success: bool,
        message: Option<&str>,
        job_id: &str,
    ) -> Check {
        match self {
            Self::JobStatus => {
                if !success {
                    return Check::Failed(Error::Api {
                        message: message.map_or_else(
                            || format!("job {job_id} status check failed"),
                            String::from,
                        ),
                        code: root.attr("code").map(String::from),
                    });
                }
                match root.find("result/job/status") {
                    None => Check::Failed(Error::Protocol {
                        message: format!("no status element in job {job_id} response"),
                    }),
                    Some(status) => match status.trimmed_text() {
                        Some(JOB_FINISHED) => Check::Finished,
                        other => Check::Pending(other.map(String::from)),
                    },
                }
            }
            Self::NoChangesMessage => {
                if message == Some(NO_CHANGES_TO_COMMIT) {
                    Check::Finished
                } else if success {
                    Check::Pending(message.map(String::from))
                } else {
                    Check::Failed(Error::Api {
                        message: message.unwrap_or("commit resubmission failed").to_owned(),
                        code: root.attr("code").map(String::from),
                    })
                }
            }
        }
    }
}

// ── State machine ────────────────────────────────────────────────────

/// Where a polling loop stands.
#[derive(Debug)]
pub enum PollState {
    Polling,
    Done,
    TimedOut,
    Failed(Error),
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Scheduler-agnostic poll loop bookkeeping for one job.
#[derive(Debug)]
pub struct JobPoll {
    job_id: String,
    settings: PollSettings,
    checks: u32,
}

impl JobPoll {
    pub fn new(job_id: impl Into<String>, settings: PollSettings) -> Self {
        Self {
            job_id: job_id.into(),
            settings,
            checks: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Status checks fed in so far.
    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Advance with the result of one status check, `elapsed` since the
    /// loop began.
    pub fn tick(&mut self, check: Check, elapsed: Duration) -> PollState {
        self.checks += 1;
        match check {
            Check::Failed(err) => PollState::Failed(err),
            Check::Finished => PollState::Done,
            Check::Pending(_) => match self.settings.timeout {
                Some(timeout) if elapsed > timeout => PollState::TimedOut,
                _ => PollState::Polling,
            },
        }
    }

    /// Convert a terminal state into the caller-facing result.
    pub fn finish(&self, state: PollState) -> Result<(), Error> {
        match state {
            PollState::Done => Ok(()),
            PollState::TimedOut | PollState::Polling => Err(Error::JobTimeout {
                job_id: self.job_id.clone(),
            }),
            PollState::Failed(err) => Err(err),
        }
    }
}
