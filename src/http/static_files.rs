//! Static file mounts.
//!
//! # Responsibilities
//! - Validate mount paths and directories at registration time
//! - Reject duplicate mount paths
//! - Apply mounts to an axum `Router` as `ServeDir` services
//!
//! # Design Decisions
//! - Files are served verbatim with no access control
//! - Directory contents are read lazily per request, never at mount time
//! - Trailing slashes are normalized so `/static` and `/static/` collide
//! - Collisions with routes are reported as errors before axum would panic

use std::path::{Path, PathBuf};

use axum::Router;
use thiserror::Error;
use tower_http::services::ServeDir;

/// Error returned when a static mount cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("invalid mount path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("a static mount already exists at {0:?}")]
    Conflict(String),

    #[error("static mount {mount:?} collides with the route {route:?}")]
    RouteConflict { mount: String, route: String },

    #[error("static directory {0:?} does not exist")]
    MissingDirectory(PathBuf),

    #[error("static path {0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// One `path → directory` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMount {
    pub path: String,
    pub directory: PathBuf,
}

/// Ordered table of static mounts.
#[derive(Debug, Clone, Default)]
pub struct StaticMountTable {
    mounts: Vec<StaticMount>,
}

impl StaticMountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a mount.
    pub fn add(&mut self, path: &str, directory: impl AsRef<Path>) -> Result<&StaticMount, MountError> {
        let path = normalize_mount_path(path)?;
        let directory = directory.as_ref();

        if self.mounts.iter().any(|m| m.path == path) {
            return Err(MountError::Conflict(path));
        }
        match std::fs::metadata(directory) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(MountError::NotADirectory(directory.to_path_buf())),
            Err(_) => return Err(MountError::MissingDirectory(directory.to_path_buf())),
        }

        tracing::info!(path = %path, directory = %directory.display(), "Static files mounted");
        self.mounts.push(StaticMount {
            path,
            directory: directory.to_path_buf(),
        });
        Ok(&self.mounts[self.mounts.len() - 1])
    }

    /// Fail if `route` would collide with an existing mount in the router.
    pub fn check_route(&self, route: &str) -> Result<(), MountError> {
        match self.mounts.iter().find(|m| overlaps_route(&m.path, route)) {
            Some(m) => Err(MountError::RouteConflict {
                mount: m.path.clone(),
                route: route.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Resolve a request path to the file it would be served from.
    ///
    /// Mirrors the router: the longest matching mount wins.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        self.mounts
            .iter()
            .filter_map(|m| {
                let rest = strip_mount(&m.path, request_path)?;
                Some((m.path.len(), m.directory.join(rest)))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, file)| file)
    }

    /// Register every mount on `router`.
    pub fn apply<S>(&self, mut router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        for mount in &self.mounts {
            let service = ServeDir::new(&mount.directory);
            router = if mount.path == "/" {
                router.fallback_service(service)
            } else {
                router.nest_service(&mount.path, service)
            };
        }
        router
    }
}

/// Validate a mount path and strip trailing slashes (`/` stays `/`).
pub fn normalize_mount_path(path: &str) -> Result<String, MountError> {
    let invalid = |reason| MountError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if !path.starts_with('/') {
        return Err(invalid("path must start with '/'"));
    }
    if path.contains(['{', '}', '*']) {
        return Err(invalid("path must not contain route parameters or wildcards"));
    }
    if path.contains("//") {
        return Err(invalid("path must not contain empty segments"));
    }
    let trimmed = path.trim_end_matches('/');
    Ok(if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() })
}

/// True if a mount at `mount` and a route at `route` cannot share a router.
///
/// A mount owns its own path and everything below it, so any route at or
/// under it collides. The root mount is a fallback and collides with nothing.
pub fn overlaps_route(mount: &str, route: &str) -> bool {
    if mount == "/" {
        return false;
    }
    let trimmed = route.trim_end_matches('/');
    let route = if trimmed.is_empty() { "/" } else { trimmed };
    if route == mount {
        return true;
    }
    route
        .strip_prefix(mount)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn strip_mount<'a>(mount: &str, request_path: &'a str) -> Option<&'a str> {
    if mount == "/" {
        return Some(request_path.trim_start_matches('/'));
    }
    let rest = request_path.strip_prefix(mount)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}
