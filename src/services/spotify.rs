use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use governor::{
    clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Low-level Spotify HTTP client. Holds the app credentials and talks to
/// the token endpoint and the data API; callers supply the per-user
/// access token for data calls (tokens are never cached here).
///
/// Cloning is cheap and clones share one rate limiter, so the outbound
/// budget holds across every clone of the same client.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    api_base: String,
    accounts_base: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    pub height: Option<i32>,
    pub width: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbumRef {
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbumRef,
    pub preview_url: Option<String>,
    pub duration_ms: i32,
}

#[derive(Debug, Deserialize)]
pub struct TopItemsResponse<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedItem {
    pub track: SpotifyTrack,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<RecentlyPlayedItem>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub external_urls: ExternalUrls,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        // Rate limiter: 2 requests per second to stay under Spotify's ~3 req/sec limit
        let quota = Quota::per_second(nonzero!(2u32));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client: Client::new(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
            api_base: config.spotify_api_base.clone(),
            accounts_base: config.spotify_accounts_base.clone(),
            rate_limiter,
        }
    }

    /// Build the provider authorization URL for the redirect handshake.
    pub fn authorize_url(&self, state: &str) -> String {
        let scopes = [
            "user-read-email",
            "user-top-read",
            "user-read-recently-played",
            "playlist-modify-private",
        ];

        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
            self.accounts_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            state
        )
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    /// Exchange an authorization code for the initial token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ];

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_base))
            .header("Authorization", self.basic_auth_header())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Authentication(format!(
                "Failed to exchange code: {}",
                error_text
            )));
        }

        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a new access token. Exactly one
    /// attempt; any failure surfaces as `TokenRefreshFailed`.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_base))
            .header("Authorization", self.basic_auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::TokenRefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("unreadable body: {}", e));
            return Err(AppError::TokenRefreshFailed(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenRefreshFailed(e.to_string()))
    }

    /// Bearer-authenticated GET against the data API.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        access_token: &str,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}{}", self.api_base, endpoint))
            .query(params)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(AppError::Upstream { status, body });
        }

        Ok(response.json().await?)
    }

    /// Bearer-authenticated POST against the data API.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        access_token: &str,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{}{}", self.api_base, endpoint))
            .header("Authorization", format!("Bearer {}", access_token))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(AppError::Upstream { status, body });
        }

        Ok(response.json().await?)
    }

    /// Fetch the authenticated user's profile.
    pub async fn get_profile(&self, access_token: &str) -> Result<SpotifyProfile> {
        self.get_json("/me", &[], access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    #[test]
    fn test_authorize_url_contains_scopes_and_state() {
        let client = SpotifyClient::new(&test_config());
        let url = client.authorize_url("abc123");

        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("user-top-read"));
        assert!(url.ends_with("state=abc123"));
    }

    #[test]
    fn test_basic_auth_header_encodes_credentials() {
        let client = SpotifyClient::new(&test_config());
        let header = client.basic_auth_header();

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"test_client_id:test_client_secret");
    }

    #[test]
    fn test_clones_share_one_rate_limiter() {
        let client = SpotifyClient::new(&test_config());
        let clone = client.clone();

        assert!(Arc::ptr_eq(&client.rate_limiter, &clone.rate_limiter));
    }
}
