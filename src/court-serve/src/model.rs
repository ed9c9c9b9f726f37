use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Lifecycle states of a custom model version, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    TrainingInProgress,
    TrainingCompleted,
    TrainingFailed,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    Deleting,
}

impl ModelStatus {
    /// Whether the model can serve detection requests right now.
    pub fn is_serving(&self) -> bool {
        matches!(self, ModelStatus::Running)
    }

    /// Whether training finished and the model can be started or used.
    pub fn is_usable(&self) -> bool {
        matches!(self, ModelStatus::TrainingCompleted | ModelStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::TrainingInProgress => "TRAINING_IN_PROGRESS",
            ModelStatus::TrainingCompleted => "TRAINING_COMPLETED",
            ModelStatus::TrainingFailed => "TRAINING_FAILED",
            ModelStatus::Starting => "STARTING",
            ModelStatus::Running => "RUNNING",
            ModelStatus::Stopping => "STOPPING",
            ModelStatus::Stopped => "STOPPED",
            ModelStatus::Failed => "FAILED",
            ModelStatus::Deleting => "DELETING",
        }
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One version of a custom-model project.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVersion {
    pub arn: String,
    pub status: ModelStatus,
}

/// Seam over the provider's model-control calls, so readiness logic can be
/// exercised without a network.
pub trait ModelProbe {
    fn status(&self) -> Result<ModelStatus>;
    fn start(&self) -> Result<()>;
}

/// Bounded retry parameters for waiting on model readiness. Both the
/// attempt cap and the wall-clock deadline limit the wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 30,
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Wait until the probed model reports RUNNING. A STOPPED model is started
/// once; training and transitional states are polled until the policy runs
/// out. Terminal failure states abort immediately.
pub fn await_ready(probe: &dyn ModelProbe, policy: &RetryPolicy) -> Result<ModelStatus> {
    let deadline = Instant::now() + policy.timeout;
    let mut started = false;
    let mut last = None;

    for attempt in 0..policy.max_attempts {
        let status = probe.status()?;
        debug!("model status ({}): {}", attempt + 1, status);
        last = Some(status);

        match status {
            ModelStatus::Running => return Ok(status),
            ModelStatus::Stopped if !started => {
                info!("model stopped, requesting start");
                probe.start()?;
                started = true;
            }
            ModelStatus::TrainingFailed | ModelStatus::Failed | ModelStatus::Deleting => {
                return Err(DetectError::ModelNotReady(status.to_string()));
            }
            _ => {}
        }

        if Instant::now() >= deadline {
            warn!("deadline reached waiting for model");
            break;
        }

        if attempt + 1 < policy.max_attempts && !policy.interval.is_zero() {
            thread::sleep(policy.interval);
        }
    }

    let last = last.map(|s| s.to_string()).unwrap_or_else(|| "?".to_owned());
    Err(DetectError::ModelNotReady(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Scripted probe: hands out statuses in order and records start calls.
    struct ScriptedProbe {
        statuses: RefCell<Vec<ModelStatus>>,
        starts: Cell<u32>,
    }

    impl ScriptedProbe {
        fn new(mut statuses: Vec<ModelStatus>) -> Self {
            statuses.reverse();
            ScriptedProbe {
                statuses: RefCell::new(statuses),
                starts: Cell::new(0),
            }
        }
    }

    impl ModelProbe for ScriptedProbe {
        fn status(&self) -> Result<ModelStatus> {
            let mut statuses = self.statuses.borrow_mut();
            // Repeat the final scripted status once the script runs out.
            match statuses.len() {
                0 => panic!("probe called with an empty script"),
                1 => Ok(statuses[0]),
                _ => Ok(statuses.pop().unwrap()),
            }
        }

        fn start(&self) -> Result<()> {
            self.starts.set(self.starts.get() + 1);
            Ok(())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            interval: Duration::from_secs(0),
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn running_model_returns_immediately() {
        let probe = ScriptedProbe::new(vec![ModelStatus::Running]);
        let status = await_ready(&probe, &fast_policy(5)).unwrap();
        assert_eq!(status, ModelStatus::Running);
        assert_eq!(probe.starts.get(), 0);
    }

    #[test]
    fn stopped_model_is_started_exactly_once() {
        let probe = ScriptedProbe::new(vec![
            ModelStatus::Stopped,
            ModelStatus::Stopped,
            ModelStatus::Starting,
            ModelStatus::Running,
        ]);
        let status = await_ready(&probe, &fast_policy(10)).unwrap();
        assert_eq!(status, ModelStatus::Running);
        assert_eq!(probe.starts.get(), 1);
    }

    #[test]
    fn exhausted_attempts_report_the_last_status() {
        let probe = ScriptedProbe::new(vec![ModelStatus::Starting]);
        let err = await_ready(&probe, &fast_policy(3)).unwrap_err();
        match err {
            DetectError::ModelNotReady(status) => assert_eq!(status, "STARTING"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn failed_training_aborts_without_retrying() {
        let probe = ScriptedProbe::new(vec![ModelStatus::TrainingFailed, ModelStatus::Running]);
        let err = await_ready(&probe, &fast_policy(10)).unwrap_err();
        match err {
            DetectError::ModelNotReady(status) => assert_eq!(status, "TRAINING_FAILED"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn zero_timeout_stops_after_one_probe() {
        let probe = ScriptedProbe::new(vec![ModelStatus::Starting]);
        let policy = RetryPolicy {
            max_attempts: 30,
            interval: Duration::from_secs(0),
            timeout: Duration::from_secs(0),
        };
        assert!(await_ready(&probe, &policy).is_err());
        assert_eq!(probe.statuses.borrow().len(), 1);
    }

    #[test]
    fn status_strings_round_trip() {
        let status: ModelStatus = serde_json::from_str("\"TRAINING_COMPLETED\"").unwrap();
        assert_eq!(status, ModelStatus::TrainingCompleted);
        assert_eq!(status.to_string(), "TRAINING_COMPLETED");
        assert!(status.is_usable());
        assert!(!status.is_serving());
    }
}
