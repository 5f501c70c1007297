//! Access token port
//!
//! Token issuance is an external collaborator; the engine only needs a
//! current bearer credential and a way to force a refresh when the router
//! receives a token-refresh request.

use async_trait::async_trait;

/// Supplies the bearer credential for remote record calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// The current access token
    async fn access_token(&self) -> anyhow::Result<String>;

    /// Forces a refresh and returns the new token
    async fn refresh(&self) -> anyhow::Result<String>;
}

/// A fixed token, for tests and single-session use
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> anyhow::Result<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> anyhow::Result<String> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("tok-1");
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
        assert_eq!(provider.refresh().await.unwrap(), "tok-1");
    }
}
