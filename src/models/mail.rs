//! Mail settings sourced from the environment.

use crate::error::{AppError, Result};

pub const ENV_FROM: &str = "MAIL_FROM";
pub const ENV_TO: &str = "MAIL_TO";
pub const ENV_HOST: &str = "SMTP_HOST";
pub const ENV_PORT: &str = "SMTP_PORT";
pub const ENV_USER: &str = "SMTP_USER";
pub const ENV_PASSWORD: &str = "SMTP_PASSWORD";

/// Raw mail settings; every field is optional until resolved.
#[derive(Debug, Clone, Default)]
pub struct MailSettings {
    pub from: Option<String>,
    pub to: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Mail settings with every required value present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub from: String,
    pub recipients: Vec<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl MailSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            from: get(ENV_FROM),
            to: get(ENV_TO),
            host: get(ENV_HOST),
            port: get(ENV_PORT),
            user: get(ENV_USER),
            password: get(ENV_PASSWORD),
        }
    }

    /// Resolve into complete SMTP settings.
    ///
    /// Fails with `AppError::MailConfig` naming every missing or unusable
    /// variable.
    pub fn resolve(&self) -> Result<SmtpSettings> {
        let mut missing = Vec::new();

        let recipients: Vec<String> = self
            .to
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        let port = self.port.as_deref().and_then(|p| p.trim().parse::<u16>().ok());

        if self.from.is_none() {
            missing.push(ENV_FROM);
        }
        if recipients.is_empty() {
            missing.push(ENV_TO);
        }
        if self.host.is_none() {
            missing.push(ENV_HOST);
        }
        if port.is_none() {
            missing.push(ENV_PORT);
        }
        if self.user.is_none() {
            missing.push(ENV_USER);
        }
        if self.password.is_none() {
            missing.push(ENV_PASSWORD);
        }

        let (Some(from), Some(host), Some(port), Some(user), Some(password), true) = (
            &self.from,
            &self.host,
            port,
            &self.user,
            &self.password,
            missing.is_empty(),
        ) else {
            return Err(AppError::MailConfig { missing });
        };

        Ok(SmtpSettings {
            from: from.trim().to_string(),
            recipients,
            host: host.trim().to_string(),
            port,
            user: user.clone(),
            password: password.clone(),
        })
    }
}
