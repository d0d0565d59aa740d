//! Host system probes.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::SystemError;

/// Queries about the host the node will run on.
#[async_trait]
pub trait System: Send + Sync {
    /// Whether a working docker installation is present.
    async fn is_docker_available(&self) -> Result<bool, SystemError>;
}

/// Probes the host by running the docker CLI.
pub struct DockerSystem {
    program: String,
}

impl DockerSystem {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }

    /// Use a different executable (e.g. `podman`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for DockerSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl System for DockerSystem {
    async fn is_docker_available(&self) -> Result<bool, SystemError> {
        match Command::new(&self.program).arg("-v").output().await {
            Ok(output) => {
                let available = output.status.success();
                tracing::debug!(
                    program = %self.program,
                    available,
                    version = %String::from_utf8_lossy(&output.stdout).trim(),
                    "Docker probe finished"
                );
                Ok(available)
            }
            // Executable missing is an answer, not a failure.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SystemError::CommandFailed {
                command: format!("{} -v", self.program),
                reason: e.to_string(),
            }),
        }
    }
}
