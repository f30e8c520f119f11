//! Calls the public site makes on behalf of a signed-in user, and the
//! multiplier adjuster shown next to calculated values.

use cnc_common::{FaqVideo, IssueReport, NewsletterSignup, ShareSettingsRequest};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use tracing::{debug, info};

use crate::api::send;
use crate::{AdminConfig, AdminError, AdminResult};

/// Client of the public API. Authenticated calls use `Bearer <token>`.
#[derive(Debug, Clone)]
pub struct PublicClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PublicClient {
    pub fn new(config: &AdminConfig) -> AdminResult<Self> {
        let base_url = config
            .public_base_url
            .clone()
            .ok_or_else(|| AdminError::MissingConfig("Missing base URL in configuration".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: config.auth_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = format!("Bearer {}", self.token.as_deref().unwrap_or_default());
        self.request(method, path).header(AUTHORIZATION, bearer)
    }

    /// Video shown on the FAQ page. Anonymous.
    pub async fn faq_video(&self) -> AdminResult<FaqVideo> {
        let response = send(self.request(Method::GET, "/videos/faq")).await?;
        response.json::<FaqVideo>().await.map_err(|e| AdminError::Decode(e.to_string()))
    }

    /// Anonymous newsletter signup.
    pub async fn subscribe(&self, signup: &NewsletterSignup) -> AdminResult<()> {
        send(self.request(Method::POST, "/newsletter").json(signup)).await?;
        info!("Newsletter signup sent");
        Ok(())
    }

    pub async fn report_issue(&self, report: &IssueReport) -> AdminResult<()> {
        send(self.authorized(Method::POST, "/report").json(report)).await?;
        info!("Issue report sent");
        Ok(())
    }

    pub async fn share_settings(&self, share: &ShareSettingsRequest) -> AdminResult<()> {
        send(self.authorized(Method::POST, "/cnc/share-settings").json(share)).await?;
        info!("Settings shared");
        Ok(())
    }

    /// Forget the user's remembered machine/spindle/bit/material choice.
    pub async fn reset_preference(&self) -> AdminResult<()> {
        send(self.authorized(Method::DELETE, "/cnc/reset-preference")).await?;
        info!("Saved preference reset");
        Ok(())
    }
}

/// Scaling factor adjusted in 0.1 steps, always held at one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplier(f64);

impl Default for Multiplier {
    fn default() -> Self {
        Self(1.0)
    }
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Multiplier {
    pub fn new(value: f64) -> Self {
        Self(one_decimal(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 = one_decimal(self.0 + 0.1);
    }

    pub fn decrement(&mut self) {
        self.0 = one_decimal(self.0 - 0.1);
    }

    /// Typed input. Anything that does not parse as a number becomes 0.
    pub fn set_from_input(&mut self, input: &str) {
        self.0 = input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(one_decimal)
            .unwrap_or(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stay_on_one_decimal() {
        let mut m = Multiplier::new(0.7);
        m.increment();
        m.increment();
        assert_eq!(m.value(), 0.9);
        m.increment();
        assert_eq!(m.value(), 1.0);
        m.decrement();
        assert_eq!(m.value(), 0.9);
    }

    #[test]
    fn typed_input_is_rounded_or_zeroed() {
        let mut m = Multiplier::default();
        m.set_from_input("1.26");
        assert_eq!(m.value(), 1.3);
        m.set_from_input("abc");
        assert_eq!(m.value(), 0.0);
        m.set_from_input("");
        assert_eq!(m.value(), 0.0);
    }

    #[test]
    fn missing_public_url_is_a_config_error() {
        let config = AdminConfig::new("http://localhost:1");
        let err = PublicClient::new(&config).unwrap_err();
        assert_eq!(err.to_string(), "Missing base URL in configuration");
    }
}
