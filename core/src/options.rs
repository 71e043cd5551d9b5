//! Option validation for the cost agent
//!
//! The host sends every option once, at initialization. Validation either
//! produces a complete [`CostConfig`] or a [`ConfigError`] listing every
//! problem found; nothing is applied halfway.

use std::collections::BTreeMap;

use log::debug;

use crate::error::ConfigError;
use crate::protocol::{OptionEntry, OptionInfo, OptionValue, ValueType};

pub const HOURLY_COST: &str = "hourly_cost";
pub const TOTAL_CPU: &str = "total_cpu";
pub const TOTAL_MEMORY: &str = "total_memory";

const MISSING_HOURLY_COST: &str = " must supply the hourly cost of your entire kubernetes cluster";
const MISSING_TOTAL_CPU: &str = " must supply the total available millicores in your cluster";
const MISSING_TOTAL_MEMORY: &str =
    " must supply the total available memory in megabytes from your cluster";

/// Largest `hourly_cost` whose costs stay finite for any usage sample.
///
/// Worst case is `i64::MAX` uptime and `i64::MAX` usage against a capacity
/// of one; half of that keeps rounding clear of infinity.
pub fn max_hourly_cost() -> f64 {
    let max_hours = i64::MAX as f64 / crate::cost::UPTIME_UNITS_PER_HOUR;
    f64::MAX / (max_hours * i64::MAX as f64) / 2.0
}

/// Cluster pricing settings.
///
/// Only [`validate`] builds one, so every value is known to be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostConfig {
    hourly_cost: f64,
    total_cpu: i64,
    total_memory: i64,
}

impl CostConfig {
    /// Cost of the whole cluster per hour
    pub fn hourly_cost(&self) -> f64 {
        self.hourly_cost
    }

    /// Cluster CPU capacity in millicores
    pub fn total_cpu(&self) -> i64 {
        self.total_cpu
    }

    /// Cluster memory capacity in megabytes
    pub fn total_memory(&self) -> i64 {
        self.total_memory
    }
}

/// Options the agent understands, with the value types it expects
pub fn recognized_options() -> BTreeMap<String, OptionInfo> {
    [
        (HOURLY_COST, ValueType::Double),
        (TOTAL_CPU, ValueType::Int),
        (TOTAL_MEMORY, ValueType::Int),
    ]
    .into_iter()
    .map(|(name, value_type)| {
        (
            name.to_string(),
            OptionInfo {
                value_types: vec![value_type],
            },
        )
    })
    .collect()
}

/// Parse and validate the init options.
///
/// Unknown option names are ignored. When an option is repeated the last
/// entry wins; within an entry only the first value is read.
pub fn validate(options: &[OptionEntry]) -> Result<CostConfig, ConfigError> {
    let mut hourly_cost = 0.0_f64;
    let mut total_cpu = 0_i64;
    let mut total_memory = 0_i64;
    let mut problems = String::new();

    for entry in options {
        let first = entry.values.first();
        match entry.name.as_str() {
            HOURLY_COST => match first {
                Some(OptionValue::Double(value)) => hourly_cost = *value,
                // Integral prices are common enough in TICKscripts to accept
                Some(OptionValue::Int(value)) => hourly_cost = *value as f64,
                other => wrong_type(&mut problems, &entry.name, ValueType::Double, other),
            },
            TOTAL_CPU => match first {
                Some(OptionValue::Int(value)) => total_cpu = *value,
                other => wrong_type(&mut problems, &entry.name, ValueType::Int, other),
            },
            TOTAL_MEMORY => match first {
                Some(OptionValue::Int(value)) => total_memory = *value,
                other => wrong_type(&mut problems, &entry.name, ValueType::Int, other),
            },
            name => debug!("ignoring unrecognized option {}", name),
        }
    }

    if hourly_cost < 0.0 {
        not_positive(&mut problems, HOURLY_COST);
    }
    if hourly_cost > max_hourly_cost() {
        problems.push_str(&format!(
            " option {} exceeds {:e} and cannot be priced",
            HOURLY_COST,
            max_hourly_cost()
        ));
    }
    if total_cpu < 0 {
        not_positive(&mut problems, TOTAL_CPU);
    }
    if total_memory < 0 {
        not_positive(&mut problems, TOTAL_MEMORY);
    }

    if hourly_cost == 0.0 {
        problems.push_str(MISSING_HOURLY_COST);
    }
    if total_cpu == 0 {
        problems.push_str(MISSING_TOTAL_CPU);
    }
    if total_memory == 0 {
        problems.push_str(MISSING_TOTAL_MEMORY);
    }

    if problems.is_empty() {
        Ok(CostConfig {
            hourly_cost,
            total_cpu,
            total_memory,
        })
    } else {
        Err(ConfigError::new(problems))
    }
}

fn wrong_type(problems: &mut String, name: &str, expected: ValueType, got: Option<&OptionValue>) {
    match got {
        Some(value) => problems.push_str(&format!(
            " option {} expects {} value, got {}",
            name,
            expected,
            value.value_type()
        )),
        None => problems.push_str(&format!(
            " option {} expects {} value, got none",
            name, expected
        )),
    }
}

fn not_positive(problems: &mut String, name: &str) {
    problems.push_str(&format!(" option {} must be positive", name));
}
