// ABOUTME: Platform capability trait abstracting the managed container service.
// ABOUTME: State reads, desired-image updates, and health polls with a shared error taxonomy.

use async_trait::async_trait;

use crate::types::{ArtifactRef, ServiceId};

/// Errors from platform operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("service not found: {0}")]
    NotFound(String),

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("platform temporarily unavailable: {0}")]
    TransientUnavailable(String),
}

impl PlatformError {
    /// Whether retrying the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlatformError::TransientUnavailable(_))
    }
}

/// Point-in-time view of a service as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
    /// Artifact the platform is currently moving toward.
    pub desired_artifact: ArtifactRef,
    /// Tasks currently running, regardless of health.
    pub running_task_count: u32,
    /// Tasks passing their health checks.
    pub healthy_task_count: u32,
    /// Last artifact the service fully converged on. Rollback anchor.
    pub last_stable_artifact: ArtifactRef,
}

/// Result of a single health poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub healthy_count: u32,
    pub desired_count: u32,
    /// Artifact the running tasks were launched from.
    pub current_artifact: ArtifactRef,
}

/// Operations the rollout controller needs from a container platform.
///
/// This is the single coupling point to the platform: bind it to a real
/// orchestration API or to [`InMemoryPlatform`](super::InMemoryPlatform)
/// without touching the controller.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch the current state of a service.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the service does not exist, or
    /// `TransientUnavailable` if the platform API is temporarily
    /// unreachable (retryable).
    async fn get_service_state(
        &self,
        service: &ServiceId,
    ) -> Result<ServiceState, PlatformError>;

    /// Ask the platform to move the service toward the given artifact.
    ///
    /// Asynchronous on the platform side: returning `Ok` means the request
    /// was accepted, not that any task is running the artifact yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArtifact` if the platform rejects the reference
    /// (non-retryable), or `TransientUnavailable` otherwise (retryable).
    async fn update_desired_image(
        &self,
        service: &ServiceId,
        target: &ArtifactRef,
    ) -> Result<(), PlatformError>;

    /// Cheap, side-effect-free health read. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `TransientUnavailable`.
    async fn poll_health(&self, service: &ServiceId) -> Result<HealthSnapshot, PlatformError>;
}
