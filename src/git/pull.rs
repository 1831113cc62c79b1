use super::{Error, Result, Syncer, BRANCH, REMOTE};
use crate::config;
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time};
use tracing::{info, instrument, warn};

/// Synchronizes repositories by running `git pull` as a child process
#[derive(Debug)]
pub struct Git {
    program: PathBuf,
    timeout: Duration,
}

impl Git {
    pub fn new<P: Into<PathBuf>>(program: P, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl From<&config::Git> for Git {
    fn from(cfg: &config::Git) -> Self {
        Git::new(&cfg.program, cfg.timeout())
    }
}

#[async_trait]
impl Syncer for Git {
    #[instrument(name = "pull", skip(self, path), fields(path = %path.display()))]
    async fn sync(&self, path: &Path) -> Result<()> {
        // The arguments are passed straight to the process, never through a shell
        let mut child = Command::new(&self.program)
            .arg("-C")
            .arg(path)
            .args(["pull", REMOTE, BRANCH])
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::Spawn)?;
        info!(pid = ?child.id(), "pulling from {}/{}", REMOTE, BRANCH);

        let waited = time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status.map_err(Error::Wait)?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to terminate timed out pull");
                }
                return Err(Error::Timeout(self.timeout));
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(Error::Exit(status.code()))
        }
    }
}
