use git2::{Error, Repository};
use std::path::Path;
use tracing::instrument;

/// Get the commit currently checked out in the repository
#[instrument(name = "head")]
pub fn head(path: &Path) -> Result<String, Error> {
    let repo = Repository::open(path)?;
    let head = repo.head()?;
    let commit = head.peel_to_commit()?.id();
    Ok(hex::encode(commit.as_bytes()))
}
