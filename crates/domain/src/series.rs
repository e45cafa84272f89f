//! Chart series and the weather reading.
//!
//! These are read-mostly data fed to the dashboard charts. They only get
//! replaced wholesale; the core attaches no logic to them beyond keeping the
//! parallel sequences the same length.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Indoor environment samples for the line chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSeries {
    pub timestamps: Vec<String>,
    pub temperature: Vec<f64>,
    /// May be empty when the source only reports temperature.
    pub humidity: Vec<f64>,
}

/// One point of an [`EnvironmentSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSample<'a> {
    pub timestamp: &'a str,
    pub temperature: f64,
    pub humidity: Option<f64>,
}

impl EnvironmentSeries {
    /// Build a series after checking that the sequences line up.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SeriesLengthMismatch`] if `temperature`
    /// (or a non-empty `humidity`) does not match `timestamps` in length.
    pub fn new(
        timestamps: Vec<String>,
        temperature: Vec<f64>,
        humidity: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let series = Self {
            timestamps,
            temperature,
            humidity,
        };
        series.validate()?;
        Ok(series)
    }

    /// Check that the parallel sequences have matching lengths.
    ///
    /// # Errors
    ///
    /// See [`EnvironmentSeries::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = self.timestamps.len();
        if self.temperature.len() != expected {
            return Err(ValidationError::SeriesLengthMismatch {
                series: "environment.temperature",
                expected,
                actual: self.temperature.len(),
            });
        }
        if !self.humidity.is_empty() && self.humidity.len() != expected {
            return Err(ValidationError::SeriesLengthMismatch {
                series: "environment.humidity",
                expected,
                actual: self.humidity.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<EnvironmentSample<'_>> {
        let last = self.timestamps.len().checked_sub(1)?;
        Some(EnvironmentSample {
            timestamp: &self.timestamps[last],
            temperature: *self.temperature.get(last)?,
            humidity: self.humidity.get(last).copied(),
        })
    }
}

/// Energy consumption per period for the bar chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySeries {
    pub labels: Vec<String>,
    /// Consumption in kWh, one entry per label.
    pub usage: Vec<f64>,
}

impl EnergySeries {
    /// Build a series after checking that the sequences line up.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SeriesLengthMismatch`] when `usage` and
    /// `labels` differ in length.
    pub fn new(labels: Vec<String>, usage: Vec<f64>) -> Result<Self, ValidationError> {
        let series = Self { labels, usage };
        series.validate()?;
        Ok(series)
    }

    /// # Errors
    ///
    /// See [`EnergySeries::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.usage.len() == self.labels.len() {
            Ok(())
        } else {
            Err(ValidationError::SeriesLengthMismatch {
                series: "energy.usage",
                expected: self.labels.len(),
                actual: self.usage.len(),
            })
        }
    }

    /// Sum of all periods.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.usage.iter().sum()
    }
}

/// Outdoor weather reading shown next to the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    pub condition: String,
    /// Outdoor temperature in °C.
    pub temperature: f64,
    pub humidity: Option<f64>,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            condition: "unknown".to_string(),
            temperature: 0.0,
            humidity: None,
        }
    }
}
