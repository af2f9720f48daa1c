use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub frontend_url: String,
    /// Provider data API base, overridable so tests can point at a mock server.
    pub spotify_api_base: String,
    /// Provider accounts/token base, overridable for the same reason.
    pub spotify_accounts_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID")
                .context("SPOTIFY_CLIENT_ID must be set")?,
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET")
                .context("SPOTIFY_CLIENT_SECRET must be set")?,
            spotify_redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                .context("SPOTIFY_REDIRECT_URI must be set")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            spotify_api_base: env::var("SPOTIFY_API_BASE")
                .unwrap_or_else(|_| SPOTIFY_API_BASE.to_string()),
            spotify_accounts_base: env::var("SPOTIFY_ACCOUNTS_BASE")
                .unwrap_or_else(|_| SPOTIFY_ACCOUNTS_BASE.to_string()),
        })
    }
}
