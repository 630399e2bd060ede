/// Hourly carbon-intensity forecast as served by the energy API.
///
/// The forecast itself is computed elsewhere; this module only parses the
/// `GET /api/forecast-24h` payload and summarises it. Samples normally
/// carry their own green/dirty classification; samples without one are
/// classified against the baseline threshold when the payload has one.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Green/dirty classification of one forecast hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowClass {
    #[serde(rename = "green_window", alias = "green")]
    Green,
    #[serde(rename = "dirty_window", alias = "dirty")]
    Dirty,
}

/// One hour of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonSample {
    #[serde(alias = "ds", alias = "hour", default)]
    pub timestamp: String,
    #[serde(alias = "carbonIntensity", alias = "carbon_intensity")]
    pub carbon_intensity_gco2_per_kwh: f64,
    #[serde(alias = "windowType", default)]
    pub window_type: Option<WindowClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPeriod {
    pub start: Option<String>,
    pub end: Option<String>,
    pub baseline_threshold: Option<f64>,
    pub current_month: Option<u32>,
}

/// The `data` object of the forecast response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub forecast_period: ForecastPeriod,
    #[serde(default, alias = "hourly_classifications", alias = "hourly_forecast")]
    pub hourly_data: Vec<CarbonSample>,
    #[serde(default)]
    pub baseline_threshold: Option<f64>,
}

/// Monthly baselines from `GET /api/seasonal-baseline`, keyed by month
/// number (`"1"`..`"12"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonalBaseline(pub BTreeMap<String, f64>);

impl SeasonalBaseline {
    pub fn for_month(&self, month: u32) -> Option<f64> {
        self.0.get(&month.to_string()).copied()
    }
}

/// Aggregate view of a forecast, used by `aura forecast`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub total_hours: usize,
    pub green_hours: usize,
    pub dirty_hours: usize,
    pub unclassified_hours: usize,
    pub avg_carbon_intensity: f64,
    pub min_carbon_intensity: f64,
    pub max_carbon_intensity: f64,
    pub baseline_threshold: Option<f64>,
    /// Longest run of consecutive green hours.
    pub best_green_run: Option<GreenRun>,
}

/// A contiguous stretch of green hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreenRun {
    pub start: String,
    pub end: String,
    pub hours: usize,
    pub avg_carbon_intensity: f64,
}

impl Forecast {
    /// Baseline threshold from the payload root or its forecast period.
    pub fn baseline(&self) -> Option<f64> {
        self.baseline_threshold
            .or(self.forecast_period.baseline_threshold)
    }

    /// Effective classification of a sample: its own label, else the
    /// baseline comparison, else `None`.
    pub fn classify(&self, sample: &CarbonSample) -> Option<WindowClass> {
        sample.window_type.or_else(|| {
            self.baseline().map(|baseline| {
                if sample.carbon_intensity_gco2_per_kwh < baseline {
                    WindowClass::Green
                } else {
                    WindowClass::Dirty
                }
            })
        })
    }

    /// Summarise the forecast. `None` when it holds no samples.
    pub fn summarize(&self) -> Option<ForecastSummary> {
        if self.hourly_data.is_empty() {
            return None;
        }

        let classes: Vec<Option<WindowClass>> =
            self.hourly_data.iter().map(|s| self.classify(s)).collect();

        let intensities = self
            .hourly_data
            .iter()
            .map(|s| s.carbon_intensity_gco2_per_kwh);
        let total: f64 = intensities.clone().sum();
        let min = intensities.clone().fold(f64::INFINITY, f64::min);
        let max = intensities.fold(f64::NEG_INFINITY, f64::max);

        let green_hours = classes
            .iter()
            .filter(|c| **c == Some(WindowClass::Green))
            .count();
        let dirty_hours = classes
            .iter()
            .filter(|c| **c == Some(WindowClass::Dirty))
            .count();

        Some(ForecastSummary {
            total_hours: self.hourly_data.len(),
            green_hours,
            dirty_hours,
            unclassified_hours: self.hourly_data.len() - green_hours - dirty_hours,
            avg_carbon_intensity: round2(total / self.hourly_data.len() as f64),
            min_carbon_intensity: min,
            max_carbon_intensity: max,
            baseline_threshold: self.baseline(),
            best_green_run: self.best_green_run(&classes),
        })
    }

    /// Longest green run; ties go to the lower average intensity, then the
    /// earlier run.
    fn best_green_run(&self, classes: &[Option<WindowClass>]) -> Option<GreenRun> {
        let mut best: Option<(usize, usize, f64)> = None;
        let mut i = 0;

        while i < classes.len() {
            if classes[i] != Some(WindowClass::Green) {
                i += 1;
                continue;
            }
            let start = i;
            while i < classes.len() && classes[i] == Some(WindowClass::Green) {
                i += 1;
            }
            let len = i - start;
            let avg = self.hourly_data[start..i]
                .iter()
                .map(|s| s.carbon_intensity_gco2_per_kwh)
                .sum::<f64>()
                / len as f64;

            let better = match best {
                None => true,
                Some((_, best_len, best_avg)) => {
                    len > best_len || (len == best_len && avg < best_avg)
                }
            };
            if better {
                best = Some((start, len, avg));
            }
        }

        best.map(|(start, len, avg)| GreenRun {
            start: self.hourly_data[start].timestamp.clone(),
            end: self.hourly_data[start + len - 1].timestamp.clone(),
            hours: len,
            avg_carbon_intensity: round2(avg),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
