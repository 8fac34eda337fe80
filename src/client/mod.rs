mod builder;
mod limiter;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::log_debug;
pub use builder::ClientBuilder;
pub use limiter::RateLimiter;
use rquest::Client as RquestClient;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct ClientResponse {
    pub status: u16,
    pub content: String,
}

/// HTTP fetcher for chapter pages. Every request waits on the shared limiter.
pub struct Client {
    inner: RquestClient,
    limiter: Arc<RateLimiter>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(
            config.burst,
            Duration::from_millis(config.delay_ms),
        ));

        Client::builder()
            .user_agent(&config.user_agent)
            .header("accept", "text/html,application/xhtml+xml")?
            .rate_limiter(limiter)
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
    }

    pub async fn get(&self, url: &str) -> Result<ClientResponse> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?
            .to_string();

        self.limiter.acquire().await;
        log_debug!("[client] GET {}", url);
        self.request(&url).await
    }

    async fn request(&self, url: &str) -> Result<ClientResponse> {
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status_code: status,
                url: url.to_string(),
            }
            .into());
        }

        let content = response.text().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: format!("Failed to get response text: {}", e),
        })?;

        Ok(ClientResponse { status, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn test_client() -> Client {
        Client::from_config(&FetchConfig {
            delay_ms: 1,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_html_with_fixed_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/1-introduction")
            .match_header("user-agent", "PhysicsStudyHub-Scraper/1.0 (educational use)")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<h1>Units and Measurement</h1>")
            .create_async()
            .await;

        let client = test_client();
        let response = client
            .get(&format!("{}/1-introduction", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.content.contains("Units and Measurement"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _failing = server
            .mock("GET", "/2-introduction")
            .with_status(500)
            .with_body("Error")
            .create_async()
            .await;

        let client = test_client();
        let url = format!("{}/2-introduction", server.url());
        let err = client.get(&url).await.unwrap_err();

        match err {
            AppError::Fetch(FetchError::Status { status_code, url: failed }) => {
                assert_eq!(status_code, 500);
                assert_eq!(failed, url);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_gets_wait_on_the_limiter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/3-introduction")
            .with_status(200)
            .with_body("<h1>Vectors</h1>")
            .expect(2)
            .create_async()
            .await;

        let config = FetchConfig {
            delay_ms: 1000,
            ..FetchConfig::default()
        };
        let client = Client::from_config(&config).unwrap();
        let url = format!("{}/3-introduction", server.url());

        let start = tokio::time::Instant::now();
        client.get(&url).await.unwrap();
        client.get(&url).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(config.delay_ms));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        let client = test_client();
        let err = client.get("not a url").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn builder_requires_limiter() {
        let result = Client::builder().user_agent("test-agent").build();
        assert!(matches!(
            result,
            Err(AppError::Fetch(FetchError::BuildError(_)))
        ));
    }
}
