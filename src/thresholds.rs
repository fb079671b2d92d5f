use serde::Serialize;

use crate::error::ConfigError;

/// The 12 tuning knobs of the scoring engine. Immutable once built; every
/// scoring call takes a reference and never writes back, so concurrent
/// requests with different overrides cannot interfere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSet {
    /// Completion lag (planned minus actual) at which schedule variance
    /// scores 0.
    pub sched_lag_max: f64,
    /// Forecast slip in days at which the slip metric scores 0.
    pub slip_days_max: f64,
    /// Net backlog growth (items) at which the backlog metric scores 0.
    pub net_backlog_max: f64,
    /// Requirement changes per four weeks at which churn scores 0.
    pub req_churn_max: f64,
    /// Defect escape rate at which the escape metric scores 0.
    pub defect_escape_max: f64,
    /// Critical defects per team member at which the metric scores 0.
    pub crit_defect_ratio: f64,
    /// Blocked days per two weeks at which the metric scores 0.
    pub blocked_days_max: f64,
    /// Unplanned work ratio at which the metric scores 0.
    pub unplanned_max: f64,
    /// Dependency count at which the metric scores 0.
    pub dep_count_max: f64,
    /// CPI at or below this scores 0; 1.0 scores 1.0.
    pub cpi_floor: f64,
    /// SPI at or below this scores 0; 1.0 scores 1.0.
    pub spi_floor: f64,
    /// Milestone hit-rate at or below this scores 0; 1.0 scores 1.0.
    pub milestone_floor: f64,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            sched_lag_max: 0.20,
            slip_days_max: 140.0,
            net_backlog_max: 50.0,
            req_churn_max: 15.0,
            defect_escape_max: 0.15,
            crit_defect_ratio: 2.0,
            blocked_days_max: 10.0,
            unplanned_max: 0.60,
            dep_count_max: 15.0,
            cpi_floor: 0.70,
            spi_floor: 0.70,
            milestone_floor: 0.50,
        }
    }
}

impl ThresholdSet {
    pub const KEYS: [&'static str; 12] = [
        "sched_lag_max",
        "slip_days_max",
        "net_backlog_max",
        "req_churn_max",
        "defect_escape_max",
        "crit_defect_ratio",
        "blocked_days_max",
        "unplanned_max",
        "dep_count_max",
        "cpi_floor",
        "spi_floor",
        "milestone_floor",
    ];

    /// Defaults with a set of `key=value` overrides applied. Unknown keys,
    /// non-numeric values, and out-of-domain values are rejected outright.
    pub fn with_overrides<I, S>(overrides: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for pair in overrides {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(pair.to_string()))?;
            let key = key.trim();
            let value = value.trim();
            let parsed: f64 = value.parse().map_err(|_| ConfigError::NotNumeric {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            set.apply(key, parsed)?;
        }
        Ok(set)
    }

    fn apply(&mut self, key: &str, value: f64) -> Result<(), ConfigError> {
        let slot = match key {
            "sched_lag_max" => &mut self.sched_lag_max,
            "slip_days_max" => &mut self.slip_days_max,
            "net_backlog_max" => &mut self.net_backlog_max,
            "req_churn_max" => &mut self.req_churn_max,
            "defect_escape_max" => &mut self.defect_escape_max,
            "crit_defect_ratio" => &mut self.crit_defect_ratio,
            "blocked_days_max" => &mut self.blocked_days_max,
            "unplanned_max" => &mut self.unplanned_max,
            "dep_count_max" => &mut self.dep_count_max,
            "cpi_floor" => &mut self.cpi_floor,
            "spi_floor" => &mut self.spi_floor,
            "milestone_floor" => &mut self.milestone_floor,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };

        let is_floor = key.ends_with("_floor");
        if is_floor {
            // Floors feed `(raw - floor) / (1 - floor)`; 1.0 would divide by
            // zero and anything negative makes the shape meaningless.
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ConfigError::OutOfDomain {
                    key: key.to_string(),
                    value,
                    domain: "0.0 <= value < 1.0",
                });
            }
        } else if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::OutOfDomain {
                key: key.to_string(),
                value,
                domain: "value > 0.0",
            });
        }

        *slot = value;
        Ok(())
    }

    /// Knob names with their current values, in declaration order.
    pub fn entries(&self) -> [(&'static str, f64); 12] {
        [
            ("sched_lag_max", self.sched_lag_max),
            ("slip_days_max", self.slip_days_max),
            ("net_backlog_max", self.net_backlog_max),
            ("req_churn_max", self.req_churn_max),
            ("defect_escape_max", self.defect_escape_max),
            ("crit_defect_ratio", self.crit_defect_ratio),
            ("blocked_days_max", self.blocked_days_max),
            ("unplanned_max", self.unplanned_max),
            ("dep_count_max", self.dep_count_max),
            ("cpi_floor", self.cpi_floor),
            ("spi_floor", self.spi_floor),
            ("milestone_floor", self.milestone_floor),
        ]
    }
}
