use crate::config::MAX_REPOSITORIES;
use std::{
    collections::HashMap,
    path::PathBuf,
    slice::Iter,
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// A local clone that can be synchronized with its upstream
#[derive(Debug)]
pub struct Repository {
    /// The short name pushes are matched against
    pub name: String,
    pub path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Repository {
    /// Get exclusive access to the working tree. Entries registered with the
    /// same path share the same lock. The guard is owned so it can outlive
    /// the request which acquired it.
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }
}

/// The immutable set of repositories accepting pushes
#[derive(Debug, Default)]
pub struct Registry {
    repositories: Vec<Repository>,
}

impl Registry {
    /// Build the registry from a sequence of indexed paths, stopping at the
    /// first index which is missing or empty
    pub fn scan<F, S>(mut lookup: F) -> Registry
    where
        F: FnMut(usize) -> Option<S>,
        S: AsRef<str>,
    {
        let mut locks: HashMap<PathBuf, Arc<Mutex<()>>> = HashMap::new();
        let mut repositories = Vec::new();

        for i in 0..MAX_REPOSITORIES {
            let raw = match lookup(i) {
                Some(raw) if !raw.as_ref().is_empty() => raw,
                _ => break,
            };

            let path = PathBuf::from(raw.as_ref());
            let name = short_name(raw.as_ref()).to_owned();
            let lock = locks.entry(path.clone()).or_default().clone();

            debug!(%name, path = %path.display(), "registered repository");
            repositories.push(Repository { name, path, lock });
        }

        info!("loaded {} repositories", repositories.len());
        Registry { repositories }
    }

    /// Build the registry from an ordered list of paths
    pub fn from_paths<I, S>(paths: I) -> Registry
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = paths.into_iter();
        Registry::scan(|_| paths.next())
    }

    /// Find the first repository registered under the given name
    pub fn resolve(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> Iter<'_, Repository> {
        self.repositories.iter()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// The final segment of a path, ignoring any trailing separators
fn short_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return path;
    }

    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
