use serde::Deserialize;

/// The only reference pushes are deployed from
pub const DEPLOY_REF: &str = "refs/heads/main";

/// A push to a repository
#[derive(Debug, Deserialize)]
pub struct Push {
    #[serde(rename = "ref")]
    pub reference: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub repository: Repository,
    pub pusher: Option<Pusher>,
    pub head_commit: Option<Commit>,
}

impl Push {
    /// Whether the push should trigger a sync
    pub fn should_sync(&self) -> bool {
        self.reference == DEPLOY_REF
    }
}

/// The repository information
#[derive(Debug, Deserialize)]
pub struct Repository {
    /// The repository name without its owner
    pub name: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pusher {
    pub name: Option<String>,
}

/// The most recent commit of a push
#[derive(Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: Option<String>,
    pub author: Option<Person>,
    #[serde(default)]
    pub modified: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Sent when a webhook is first created
#[derive(Debug, Default, Deserialize)]
pub struct Ping {
    pub zen: Option<String>,
    pub hook_id: Option<i64>,
}
