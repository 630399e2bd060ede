/// HTTP client for the Aura energy API.
///
/// Synchronous `ureq` calls with the configured timeout. The base URL comes
/// from `[optimizer] api_url`; an optional bearer token is attached to every
/// request.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::demand::{DemandForecast, GreenWindowComputation};
use super::forecast::{Forecast, SeasonalBaseline};
use super::{ApiEnvelope, OptimizationBackend, OptimizeRequest, OptimizeResponse};
use crate::config::schema::OptimizerConfig;

/// Banner returned by `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceBanner {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// The green-window search runs a model on the server; never wait less than this.
const COMPUTE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct OptimizerClient {
    base_url: String,
    timeout: Duration,
    auth_token: Option<String>,
}

impl OptimizerClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        // "localhost" may resolve to ::1 first while the API binds IPv4 only.
        format!("{}{path}", self.base_url).replace("://localhost", "://127.0.0.1")
    }

    fn request(&self, method: &str, path: &str, timeout: Duration) -> ureq::Request {
        let request = ureq::request(method, &self.url(path)).timeout(timeout);
        match &self.auth_token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .request("GET", path, self.timeout)
            .call()
            .with_context(|| format!("GET {path} failed"))?;

        resp.into_json()
            .with_context(|| format!("failed to parse response from {path}"))
    }

    /// `GET /`: the service banner.
    pub fn banner(&self) -> Result<ServiceBanner> {
        let resp = self
            .request("GET", "/", Duration::from_secs(5))
            .call()
            .context("energy API health check failed")?;

        resp.into_json()
            .context("failed to parse energy API banner")
    }

    /// Whether the API answers its health check.
    pub fn is_healthy(&self) -> bool {
        self.banner().is_ok()
    }

    /// `POST /api/optimize-windows`.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse> {
        request.validate()?;

        let resp = self
            .request("POST", "/api/optimize-windows", self.timeout)
            .send_json(request)
            .context("optimize-windows request failed")?;

        resp.into_json()
            .context("failed to parse optimize-windows response")
    }

    /// `GET /api/forecast-24h`.
    pub fn forecast_24h(&self) -> Result<Forecast> {
        let envelope: ApiEnvelope<Forecast> = self.get_json("/api/forecast-24h")?;
        if !envelope.success {
            anyhow::bail!("forecast request unsuccessful: {}", envelope.message);
        }
        Ok(envelope.data)
    }

    /// `GET /api/seasonal-baseline`.
    pub fn seasonal_baseline(&self) -> Result<SeasonalBaseline> {
        let envelope: ApiEnvelope<SeasonalBaseline> = self.get_json("/api/seasonal-baseline")?;
        Ok(envelope.data)
    }

    /// `GET /api/predict-demand`.
    pub fn predict_demand(&self) -> Result<DemandForecast> {
        let envelope: ApiEnvelope<DemandForecast> = self.get_json("/api/predict-demand")?;
        if !envelope.success {
            anyhow::bail!("demand prediction unsuccessful: {}", envelope.message);
        }
        Ok(envelope.data)
    }

    /// `POST /api/compute-green-window`. Takes no body.
    pub fn compute_green_window(&self) -> Result<GreenWindowComputation> {
        let resp = self
            .request(
                "POST",
                "/api/compute-green-window",
                self.timeout.max(COMPUTE_TIMEOUT),
            )
            .call()
            .context("compute-green-window request failed")?;

        let envelope: ApiEnvelope<GreenWindowComputation> = resp
            .into_json()
            .context("failed to parse compute-green-window response")?;
        if !envelope.success {
            anyhow::bail!("green window computation unsuccessful: {}", envelope.message);
        }
        Ok(envelope.data)
    }
}

impl OptimizationBackend for OptimizerClient {
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse> {
        OptimizerClient::optimize(self, request)
    }
}
