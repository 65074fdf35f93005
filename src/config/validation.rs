//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, address parses)
//! - Check static mounts and the client endpoint do not collide
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Directory existence is checked at mount time, not here

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::http::static_files::overlaps_route;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("client.ws_path {0:?} must start with '/'")]
    WsPath(String),

    #[error("static_files path {0:?} must start with '/'")]
    StaticPath(String),

    #[error("static_files path {0:?} is mounted more than once")]
    DuplicateStaticPath(String),

    #[error("static_files path {0:?} collides with the client endpoint")]
    StaticPathShadowsClient(String),

    #[error("reload.watch_paths must not be empty when reload is enabled")]
    NoWatchPaths,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.shutdown_grace_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("shutdown_grace_secs"));
    }

    let ws_path = config.client.ws_path.trim_end_matches('/');
    if !config.client.ws_path.starts_with('/') {
        errors.push(ValidationError::WsPath(config.client.ws_path.clone()));
    }

    let mut seen = HashSet::new();
    for mount in &config.static_files {
        if !mount.path.starts_with('/') {
            errors.push(ValidationError::StaticPath(mount.path.clone()));
            continue;
        }
        let normalized = match mount.path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        if !seen.insert(normalized) {
            errors.push(ValidationError::DuplicateStaticPath(mount.path.clone()));
        }
        if overlaps_route(normalized, ws_path) {
            errors.push(ValidationError::StaticPathShadowsClient(mount.path.clone()));
        }
    }

    if config.reload.enabled && config.reload.watch_paths.is_empty() {
        errors.push(ValidationError::NoWatchPaths);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StaticFilesConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.shutdown_grace_secs = 0;
        config.observability.log_level = "loud".into();
        config.static_files = vec![
            StaticFilesConfig {
                path: "/static".into(),
                directory: "a".into(),
            },
            StaticFilesConfig {
                path: "/static/".into(),
                directory: "b".into(),
            },
            StaticFilesConfig {
                path: "assets".into(),
                directory: "c".into(),
            },
            StaticFilesConfig {
                path: "/_app/ws".into(),
                directory: "d".into(),
            },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::ZeroTimeout("shutdown_grace_secs"),
                ValidationError::DuplicateStaticPath("/static/".into()),
                ValidationError::StaticPath("assets".into()),
                ValidationError::StaticPathShadowsClient("/_app/ws".into()),
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_parent_mount_shadows_client() {
        let mut config = AppConfig::default();
        config.static_files.push(StaticFilesConfig {
            path: "/_app".into(),
            directory: "public".into(),
        });
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::StaticPathShadowsClient("/_app".into())])
        );
    }

    #[test]
    fn test_reload_needs_watch_paths() {
        let mut config = AppConfig::default();
        config.reload.enabled = true;
        config.reload.watch_paths.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoWatchPaths]));
    }
}
