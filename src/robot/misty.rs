//! HTTP client for Misty's REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use super::Robot;
use crate::config::RobotConfig;
use crate::{Error, Result};

/// Bound on the startup reachability check
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DriveRequest {
    linear_velocity: f64,
    angular_velocity: f64,
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    flush: bool,
}

/// Misty robot reached over its local HTTP API
///
/// Only the probe carries a timeout; drive and speech requests wait as long
/// as the robot takes.
pub struct MistyClient {
    client: Client,
    base_url: Url,
    probe_timeout: Duration,
}

impl MistyClient {
    /// Create a client for the robot at `base_url`
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Create a client from robot configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configured address is invalid
    pub fn from_config(config: &RobotConfig) -> Result<Self> {
        Ok(Self::new(config.base_url()?))
    }

    /// Override the probe timeout
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Base URL of the robot
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid robot endpoint {path}: {e}")))
    }
}

#[async_trait(?Send)]
impl Robot for MistyClient {
    async fn probe(&self) -> bool {
        let url = match self.endpoint("api/device") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "cannot build probe URL");
                return false;
            }
        };

        let response = match self
            .client
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    robot = %self.base_url,
                    "cannot connect to Misty, check the IP and network connection"
                );
                return false;
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!(robot = %self.base_url, "Misty is online and reachable");
            return true;
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body = %body, "Misty responded, but there might be an issue");
        false
    }

    async fn drive(&self, linear_velocity: f64, angular_velocity: f64) -> Result<()> {
        let request = DriveRequest {
            linear_velocity,
            angular_velocity,
        };

        let response = self
            .client
            .post(self.endpoint("api/drive")?)
            .json(&request)
            .send()
            .await?;

        tracing::debug!(
            status = %response.status(),
            linear_velocity,
            angular_velocity,
            "drive command sent"
        );
        Ok(())
    }

    async fn speak(&self, text: &str, flush: bool) -> bool {
        let url = match self.endpoint("api/tts/speak") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "cannot build speech URL");
                return false;
            }
        };

        let response = match self
            .client
            .post(url)
            .json(&SpeakRequest { text, flush })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "speech request failed");
                return false;
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!("Misty is speaking");
            return true;
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(%status, body = %body, "Misty rejected speech request");
        false
    }
}
