use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Platform account (tenant) this service runs under
    pub account: String,
    /// This service's own application identifier, used as the default
    /// sender when scoping permission checks
    pub app_id: String,
    pub identity_url: String,
    pub permissions_url: String,
    pub document_store_url: String,
    pub analytics_url: String,
    pub audit_url: String,
    pub mail_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            account: env::var("PLATFORM_ACCOUNT")
                .context("PLATFORM_ACCOUNT must be set")?,
            app_id: env::var("APP_ID")
                .unwrap_or_else(|_| "b2b-organizations-graphql".to_string()),
            identity_url: env::var("IDENTITY_SERVICE_URL")
                .context("IDENTITY_SERVICE_URL must be set")?,
            permissions_url: env::var("PERMISSIONS_SERVICE_URL")
                .context("PERMISSIONS_SERVICE_URL must be set")?,
            document_store_url: env::var("DOCUMENT_STORE_URL")
                .context("DOCUMENT_STORE_URL must be set")?,
            analytics_url: env::var("ANALYTICS_SERVICE_URL")
                .context("ANALYTICS_SERVICE_URL must be set")?,
            audit_url: env::var("AUDIT_SERVICE_URL")
                .context("AUDIT_SERVICE_URL must be set")?,
            mail_url: env::var("MAIL_SERVICE_URL")
                .context("MAIL_SERVICE_URL must be set")?,
        })
    }
}
