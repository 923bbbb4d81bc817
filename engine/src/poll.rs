use std::time::Duration;

use log::debug;

use crate::{
    BoxFuture, Error, Result,
    credential::Credential,
    prediction::{PredictionApi, PredictionJob, PredictionStatus},
};

pub const MAX_ATTEMPTS: u32 = 120;
pub const POLL_DELAY: Duration = Duration::from_secs(5);
pub const PROGRESS_MESSAGE: &str = "Generating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: POLL_DELAY,
        }
    }
}

/// Waits between two polls. Swapped out in tests so they don't take ten minutes.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Debug)]
enum PollState {
    Polling { attempts: u32 },
    Succeeded(PredictionJob),
    Failed(String),
    TimedOut { attempts: u32 },
}

fn percent(attempts: u32, max_attempts: u32) -> u8 {
    if max_attempts == 0 {
        return 100;
    }
    (f64::from(attempts) / f64::from(max_attempts) * 100.0).round() as u8
}

/// Fetches the job until the service reports a terminal status or we run out of attempts.
///
/// `on_progress` gets a rough percentage (attempts so far over the maximum) before
/// every wait. A non-success HTTP status ends the loop right away.
pub async fn poll(
    api: &(impl PredictionApi + ?Sized),
    job_id: &str,
    credential: &Credential,
    config: &PollConfig,
    sleeper: &(impl Sleeper + ?Sized),
    mut on_progress: impl FnMut(u8, &str),
) -> Result<PredictionJob> {
    let mut state = PollState::Polling { attempts: 0 };
    loop {
        state = match state {
            PollState::Polling { attempts } if attempts >= config.max_attempts => {
                PollState::TimedOut { attempts }
            }
            PollState::Polling { attempts } => {
                let job = api.get(job_id, credential).await?;
                debug!("Poll {attempts} of {job_id}: {:?}", job.status);
                match job.status {
                    PredictionStatus::Succeeded => PollState::Succeeded(job),
                    PredictionStatus::Failed => PollState::Failed(
                        job.error
                            .unwrap_or_else(|| "Model generation failed".to_string()),
                    ),
                    PredictionStatus::Pending => {
                        on_progress(percent(attempts, config.max_attempts), PROGRESS_MESSAGE);
                        sleeper.sleep(config.delay).await;
                        PollState::Polling {
                            attempts: attempts + 1,
                        }
                    }
                }
            }
            PollState::Succeeded(job) => return Ok(job),
            PollState::Failed(message) => return Err(Error::GenerationFailed(message)),
            PollState::TimedOut { attempts } => return Err(Error::Timeout { attempts }),
        };
    }
}
