//! Session context shared by every board operation: who is acting and how
//! the board is displayed.
//!
//! The context is resolved once at startup and injected into the service;
//! consumers depend on the [`UserProvider`] capability rather than reading the
//! environment themselves.

use std::env;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::SessionConfig;

/// Environment variable checked first for the user name.
pub const ENV_USER_NAME: &str = "PLANBOARD_USER_NAME";
/// Environment variable checked first for the user email.
pub const ENV_USER_EMAIL: &str = "PLANBOARD_USER_EMAIL";
/// Fallback display name when nothing can be resolved.
pub const DEFAULT_USER_NAME: &str = "planboard";
/// Fallback email when nothing can be resolved.
pub const DEFAULT_USER_EMAIL: &str = "planboard@example.invalid";

const USER_NAME_ENV: &str = "USER";

/// The person operating the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light palette.
    Light,
    /// Dark palette.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// Capability: access to the current user.
pub trait UserProvider {
    /// The user on whose behalf operations run.
    fn current_user(&self) -> &CurrentUser;
}

/// Root-level context handed to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Acting user.
    pub user: CurrentUser,
    /// Theme preference.
    pub theme: Theme,
}

impl SessionContext {
    /// Resolve the session from the environment, then configuration, then defaults.
    pub fn resolve(config: &SessionConfig) -> Self {
        let mut fetch = |key: &'static str| env::var(key).ok();
        Self::resolve_with(config, &mut fetch)
    }

    fn resolve_with(config: &SessionConfig, fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Self {
        let user = user_from_env_with(fetch)
            .or_else(|_| user_from_config(config))
            .unwrap_or_else(|_| CurrentUser {
                name: DEFAULT_USER_NAME.to_owned(),
                email: DEFAULT_USER_EMAIL.to_owned(),
            });
        Self {
            user,
            theme: config.theme,
        }
    }
}

impl UserProvider for SessionContext {
    fn current_user(&self) -> &CurrentUser {
        &self.user
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            user: CurrentUser {
                name: DEFAULT_USER_NAME.to_owned(),
                email: DEFAULT_USER_EMAIL.to_owned(),
            },
            theme: Theme::default(),
        }
    }
}

fn user_from_config(config: &SessionConfig) -> Result<CurrentUser> {
    let name = config
        .user_name
        .clone()
        .filter(|value| !value.trim().is_empty())
        .context("session.user_name not configured")?;
    let email = config
        .user_email
        .clone()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_owned());
    Ok(CurrentUser { name, email })
}

fn env_value_with(
    candidates: &[&'static str],
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<String> {
    candidates.iter().find_map(|key| {
        fetch(key).and_then(|value| {
            if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        })
    })
}

fn user_from_env_with(fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Result<CurrentUser> {
    let name = env_value_with(&[ENV_USER_NAME, USER_NAME_ENV], fetch)
        .context("environment does not include a user name")?;
    let email = env_value_with(&[ENV_USER_EMAIL], fetch).unwrap_or_else(|| DEFAULT_USER_EMAIL.to_owned());
    Ok(CurrentUser { name, email })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_wins_over_config() {
        let mut fetch = |key: &'static str| match key {
            ENV_USER_NAME => Some("env-name".into()),
            ENV_USER_EMAIL => Some("env@example.invalid".into()),
            _ => None,
        };
        let config = SessionConfig {
            user_name: Some("cfg-name".into()),
            ..SessionConfig::default()
        };
        let session = SessionContext::resolve_with(&config, &mut fetch);
        assert_eq!(session.current_user().name, "env-name");
        assert_eq!(session.current_user().email, "env@example.invalid");
    }

    #[test]
    fn config_is_used_when_environment_is_blank() {
        let mut fetch = |key: &'static str| match key {
            USER_NAME_ENV => Some("   ".into()),
            _ => None,
        };
        let config = SessionConfig {
            user_name: Some("cfg-name".into()),
            user_email: None,
            theme: Theme::Light,
        };
        let session = SessionContext::resolve_with(&config, &mut fetch);
        assert_eq!(session.user.name, "cfg-name");
        assert_eq!(session.user.email, DEFAULT_USER_EMAIL);
        assert_eq!(session.theme, Theme::Light);
    }

    #[test]
    fn defaults_apply_when_nothing_resolves() {
        let mut fetch = |_: &'static str| None;
        let session = SessionContext::resolve_with(&SessionConfig::default(), &mut fetch);
        assert_eq!(session, SessionContext::default());
    }
}
