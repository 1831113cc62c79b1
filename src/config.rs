use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};
use tokio::fs;

/// The most repository paths that will be read from the environment
pub const MAX_REPOSITORIES: usize = 100;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT: u64 = 300;

pub type SharedConfig = Arc<Config>;

/// Parse the configuration from a given file
pub async fn parse<P: AsRef<Path>>(path: P) -> Result<SharedConfig> {
    let raw = fs::read(path).await?;
    let data: Config = toml::from_slice(&raw)?;
    data.validate()?;
    Ok(Arc::new(data))
}

/// Resolve the configuration from the process environment
pub fn from_env() -> Result<SharedConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Resolve the configuration from environment-style variables
///
/// Repository paths are read from `REPO_PATH0`, `REPO_PATH1`, ... until the
/// first index which is not set.
pub fn from_lookup<F>(lookup: F) -> Result<SharedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    let mut server = Server::default();
    if let Some(port) = lookup("PORT") {
        let port = u16::from_str(&port).with_context(|| format!("invalid PORT {:?}", port))?;
        server.address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    }
    if let Some(log) = lookup("LOG_LEVEL") {
        server.log = log;
    }
    server.sentry = lookup("SENTRY_DSN");

    let mut git = Git::default();
    if let Some(program) = lookup("GIT_PROGRAM") {
        git.program = program.into();
    }
    if let Some(timeout) = lookup("SYNC_TIMEOUT") {
        git.timeout = u64::from_str(&timeout)
            .with_context(|| format!("invalid SYNC_TIMEOUT {:?}", timeout))?;
    }

    let repositories = (0..MAX_REPOSITORIES)
        .map_while(|i| lookup(&format!("REPO_PATH{}", i)))
        .collect();

    let data = Config {
        server,
        webhook: Webhook {
            secret: lookup("SECRET").unwrap_or_default(),
        },
        git,
        repositories,
    };
    data.validate()?;

    Ok(Arc::new(data))
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    pub webhook: Webhook,
    #[serde(default)]
    pub git: Git,
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Config {
    /// Ensure the required values are present
    fn validate(&self) -> Result<()> {
        if self.webhook.secret.is_empty() {
            bail!("a webhook secret is required");
        }
        if self.git.timeout == 0 {
            bail!("the sync timeout must be at least 1 second");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub address: SocketAddr,
    pub log: String,
    pub sentry: Option<String>,
    pub tokio_console: bool,
}

impl Default for Server {
    fn default() -> Server {
        Server {
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            log: "info".into(),
            sentry: None,
            tokio_console: false,
        }
    }
}

#[derive(Deserialize)]
pub struct Webhook {
    pub secret: String,
}

impl std::fmt::Debug for Webhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhook")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Git {
    pub program: PathBuf,
    pub timeout: u64,
}

impl Git {
    /// How long a single pull may run for
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for Git {
    fn default() -> Git {
        Git {
            program: "git".into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
