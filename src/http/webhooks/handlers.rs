use super::{
    models::{Ping, Push},
    payload, validators,
};
use crate::{
    git,
    http::{Error, Result, State},
    registry::Repository,
};
use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Extension,
};
use std::{error::Error as StdError, path::PathBuf, sync::Arc};
use tokio::task;
use tracing::{debug, error, field::Empty, info, instrument, warn, Instrument, Span};

/// The header naming the kind of event delivered
const EVENT_HEADER: &str = "X-GitHub-Event";

/// Handle webhooks from GitHub
#[instrument(name = "github", skip_all, fields(event = Empty))]
pub async fn github(
    Extension(state): Extension<Arc<State>>,
    headers: HeaderMap,
    raw_body: Bytes,
) -> Result<StatusCode> {
    let event = header(&headers, EVENT_HEADER).unwrap_or("push");
    Span::current().record("event", &event);

    let raw_event = payload::decode(&raw_body, headers.get(CONTENT_TYPE)).map_err(|e| {
        warn!(kind = e.kind(), "unable to decode webhook body");
        e
    })?;

    // The signature is always checked against the body as it was sent
    validators::github(
        &raw_body,
        headers.get(validators::SIGNATURE_HEADER),
        state.secret.as_bytes(),
    )
    .map_err(|e| {
        warn!(kind = e.kind(), "invalid webhook signature");
        e
    })?;

    info!("got new {} hook", event);
    sentry::configure_scope(|scope| {
        scope.set_tag("hook.event", event);
    });

    match event {
        "push" => {
            let body: Push = payload::parse(&raw_event).map_err(|e| {
                warn!(kind = e.kind(), "unable to parse push event");
                e
            })?;
            push(&state, body).await
        }
        "ping" => {
            let body: Ping = payload::parse(&raw_event).unwrap_or_default();
            info!(zen = ?body.zen, hook_id = ?body.hook_id, "received ping");
            Ok(StatusCode::OK)
        }
        _ => {
            debug!("ignoring unhandled event");
            Ok(StatusCode::OK)
        }
    }
}

/// Handle a GitHub push event
#[instrument(
    skip_all,
    fields(repository = %body.repository.name, reference = %body.reference)
)]
async fn push(state: &State, body: Push) -> Result<StatusCode> {
    sentry::configure_scope(|scope| {
        scope.set_tag("hook.repository", &body.repository.name);
        scope.set_tag("hook.reference", &body.reference);
        if let Some(after) = &body.after {
            scope.set_tag("hook.after", after);
        }
    });
    audit(&body);

    // Pushes to other branches are accepted without doing anything
    if !body.should_sync() {
        debug!("not the deployed branch, skipping");
        return Ok(StatusCode::OK);
    }

    let repository = state
        .registry
        .resolve(&body.repository.name)
        .ok_or_else(|| {
            error!(
                kind = Error::RepositoryNotFound.kind(),
                "no repository registered under this name"
            );
            Error::RepositoryNotFound
        })?;

    sync(state, repository).await?;
    Ok(StatusCode::OK)
}

/// Pull the repository in its own task. Once started, a pull runs to
/// completion or timeout even if the request is dropped.
async fn sync(state: &State, repository: &Repository) -> Result<()> {
    // Only one pull may touch a working tree at a time
    let guard = repository.lock().await;
    let syncer = state.syncer.clone();
    let path = repository.path.clone();

    let handle = task::spawn(
        async move {
            let _guard = guard;

            info!(path = %path.display(), "pulling changes");
            if let Err(e) = syncer.sync(&path).await {
                error!(
                    kind = e.kind(),
                    error = %e,
                    source = ?e.source(),
                    "failed to pull changes",
                );
                return Err(e);
            }

            log_head(path).await;
            Ok(())
        }
        .in_current_span(),
    );

    match handle.await {
        Ok(result) => Ok(result?),
        Err(e) => {
            error!(error = %e, "pull task did not complete");
            Err(git::Error::Aborted(e).into())
        }
    }
}

/// Record who pushed what
fn audit(body: &Push) {
    let pusher = body.pusher.as_ref().and_then(|p| p.name.as_deref());
    let full_name = body.repository.full_name.as_deref();

    match &body.head_commit {
        Some(commit) => {
            let author = commit.author.as_ref();
            info!(
                ?full_name,
                ?pusher,
                before = ?body.before,
                commit = %commit.id,
                message = ?commit.message.as_deref().and_then(|m| m.lines().next()),
                author = ?author.and_then(|a| a.name.as_deref()),
                author.email = ?author.and_then(|a| a.email.as_deref()),
                author.username = ?author.and_then(|a| a.username.as_deref()),
                modified = ?commit.modified,
                "received push",
            );
        }
        None => info!(?full_name, ?pusher, "received push without a head commit"),
    }
}

/// Log the commit the repository is at after a pull
async fn log_head(path: PathBuf) {
    match task::spawn_blocking(move || git::head(&path)).await {
        Ok(Ok(commit)) => info!(%commit, "repository updated successfully"),
        Ok(Err(e)) => warn!(
            class = ?e.class(), code = ?e.code(),
            message = %e.message(),
            "unable to read updated head",
        ),
        Err(e) => warn!(error = %e, "unable to read updated head"),
    }
}

/// Get a header as a string
fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}
