/// Demand forecast and best-green-window payloads.
///
/// `GET /api/predict-demand` returns the next 24 hours of grid demand with
/// the renewable/fossil split behind each hour's carbon intensity.
/// `POST /api/compute-green-window` reruns the window search on the server
/// and returns the single lowest-intensity stretch.
use serde::{Deserialize, Serialize};

use super::forecast::{ForecastPeriod, WindowClass};

/// One forecast hour of grid demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSample {
    #[serde(alias = "ds", default)]
    pub timestamp: String,
    #[serde(default)]
    pub hour: Option<u32>,
    #[serde(alias = "forecast_load_mw")]
    pub demand_mw: f64,
    #[serde(default)]
    pub renewable_baseload_mw: f64,
    #[serde(default)]
    pub fossil_fuel_mw: f64,
    pub carbon_intensity_gco2_per_kwh: f64,
    #[serde(default)]
    pub window_type: Option<WindowClass>,
}

impl DemandSample {
    /// Renewable share of the hour's supply, in percent.
    pub fn renewable_share_pct(&self) -> Option<f64> {
        let supply = self.renewable_baseload_mw + self.fossil_fuel_mw;
        (supply > 0.0).then(|| self.renewable_baseload_mw / supply * 100.0)
    }
}

/// The `data` object of the predict-demand response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    #[serde(default)]
    pub forecast_period: ForecastPeriod,
    #[serde(default)]
    pub hourly_forecast: Vec<DemandSample>,
}

/// Aggregate view of a demand forecast, used by `aura demand`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandSummary {
    pub total_hours: usize,
    pub avg_demand_mw: f64,
    pub peak_demand_mw: f64,
    pub peak_timestamp: String,
    pub avg_carbon_intensity: f64,
    pub avg_renewable_share_pct: Option<f64>,
    pub green_hours: usize,
    pub dirty_hours: usize,
}

impl DemandForecast {
    /// Summarise the forecast. `None` when it holds no hours.
    pub fn summarize(&self) -> Option<DemandSummary> {
        let hours = &self.hourly_forecast;
        let peak = hours
            .iter()
            .max_by(|a, b| a.demand_mw.total_cmp(&b.demand_mw))?;
        let n = hours.len() as f64;

        let shares: Vec<f64> = hours
            .iter()
            .filter_map(DemandSample::renewable_share_pct)
            .collect();
        let avg_share =
            (!shares.is_empty()).then(|| round2(shares.iter().sum::<f64>() / shares.len() as f64));

        let count = |class: WindowClass| {
            hours
                .iter()
                .filter(|h| h.window_type == Some(class))
                .count()
        };

        Some(DemandSummary {
            total_hours: hours.len(),
            avg_demand_mw: round2(hours.iter().map(|h| h.demand_mw).sum::<f64>() / n),
            peak_demand_mw: peak.demand_mw,
            peak_timestamp: peak.timestamp.clone(),
            avg_carbon_intensity: round2(
                hours
                    .iter()
                    .map(|h| h.carbon_intensity_gco2_per_kwh)
                    .sum::<f64>()
                    / n,
            ),
            avg_renewable_share_pct: avg_share,
            green_hours: count(WindowClass::Green),
            dirty_hours: count(WindowClass::Dirty),
        })
    }
}

/// The lowest-intensity window found by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenWindow {
    #[serde(alias = "start")]
    pub start_time: String,
    #[serde(alias = "end")]
    pub end_time: String,
    #[serde(alias = "avg_carbon_intensity_gco2_per_kwh")]
    pub average_carbon_intensity: f64,
    #[serde(alias = "length_hours")]
    pub duration_hours: u32,
    /// Zero when the server had no baseline to report.
    #[serde(default)]
    pub baseline_threshold: f64,
    /// `"unknown"` when the server did not classify the window.
    #[serde(default)]
    pub window_type: String,
    #[serde(default, alias = "rows")]
    pub hourly_data: Vec<DemandSample>,
}

impl GreenWindow {
    /// How far the window sits under the baseline, in gCO2/kWh.
    /// `None` without a baseline.
    pub fn margin_below_baseline(&self) -> Option<f64> {
        (self.baseline_threshold > 0.0)
            .then(|| round2(self.baseline_threshold - self.average_carbon_intensity))
    }
}

/// The `data` object of the compute-green-window response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenWindowComputation {
    pub green_window: GreenWindow,
    #[serde(default)]
    pub computation_timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
