use super::{Client, RateLimiter};
use crate::error::{FetchError, Result};
use http::{
    header::{HeaderMap, HeaderName, USER_AGENT},
    HeaderValue,
};
use rquest::Client as RquestClient;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct ClientBuilder {
    user_agent: Option<String>,
    limiter: Option<Arc<RateLimiter>>,
    timeout: Option<Duration>,
    headers: HeaderMap,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            ..Default::default()
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let header_name = HeaderName::from_str(key.as_ref())
            .map_err(|e| FetchError::BuildError(format!("Invalid header name: {}", e)))?;

        let header_value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| FetchError::BuildError(format!("Invalid header value: {}", e)))?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn build(mut self) -> Result<Client> {
        let user_agent = self
            .user_agent
            .ok_or_else(|| FetchError::BuildError("User agent is required".to_string()))?;
        let user_agent = HeaderValue::from_str(&user_agent)
            .map_err(|e| FetchError::BuildError(format!("Invalid user agent: {}", e)))?;
        self.headers.insert(USER_AGENT, user_agent);

        let limiter = self
            .limiter
            .ok_or_else(|| FetchError::BuildError("Rate limiter is required".to_string()))?;

        let mut client_builder = RquestClient::builder();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let mut inner = client_builder
            .build()
            .map_err(|e| FetchError::BuildError(format!("Failed to build client: {}", e)))?;

        *inner.as_mut().headers() = self.headers;

        Ok(Client { inner, limiter })
    }
}
