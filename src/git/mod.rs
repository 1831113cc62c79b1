use async_trait::async_trait;
use std::{io::Error as IoError, path::Path, time::Duration};
use thiserror::Error as ThisError;
use tokio::task::JoinError;

mod head;
mod pull;

pub use head::head;
pub use pull::Git;

/// The only branch that is ever pulled
pub const BRANCH: &str = "main";
/// The remote the branch is pulled from
pub const REMOTE: &str = "origin";

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The possible ways a synchronization can fail
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to start the pull")]
    Spawn(#[source] IoError),
    #[error("failed to wait for the pull")]
    Wait(#[source] IoError),
    #[error("pull exited unsuccessfully (code {0:?})")]
    Exit(Option<i32>),
    #[error("pull did not finish within {0:?}")]
    Timeout(Duration),
    #[error("pull task was aborted")]
    Aborted(#[source] JoinError),
}

impl Error {
    /// A short identifier for the failure
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn(_) => "spawn",
            Self::Wait(_) => "wait",
            Self::Exit(_) => "exit",
            Self::Timeout(_) => "timeout",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Brings a local clone up to date with its upstream
#[async_trait]
pub trait Syncer: Send + Sync {
    /// Pull the latest changes into the repository at the given path
    async fn sync(&self, path: &Path) -> Result<()>;
}
