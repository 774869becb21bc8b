// ABOUTME: Rollout state machine: controller, options, record, retry schedule.
// ABOUTME: Exports the public surface for driving and observing rollouts.

mod backoff;
mod controller;
mod error;
mod options;
mod record;

pub use controller::RolloutController;
pub use error::RolloutError;
pub use options::RolloutOptions;
pub use record::{RolloutOutcome, RolloutRecord};
