//! Cost attribution for a single resource-usage point

use crate::options::CostConfig;
use crate::point::Point;

pub const CPU_FIELD: &str = "cpu.value";
pub const MEMORY_FIELD: &str = "memory.value";
pub const UPTIME_FIELD: &str = "uptime.value";

pub const CPU_COST_FIELD: &str = "cpu_cost";
pub const MEMORY_COST_FIELD: &str = "memory_cost";

/// Uptime units per billed hour, as produced by the upstream collector
pub const UPTIME_UNITS_PER_HOUR: f64 = 36_000_000.0;

/// Derived cost of one usage sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub cpu_cost: f64,
    pub memory_cost: f64,
}

/// Share of the cluster's hourly cost consumed by the given usage.
///
/// `total_cpu` and `total_memory` are non-zero by construction of
/// [`CostConfig`].
pub fn compute(cpu_usage: f64, memory_usage: f64, uptime: f64, config: &CostConfig) -> Cost {
    let hourly_uptime = uptime / UPTIME_UNITS_PER_HOUR;
    let uptime_cost = hourly_uptime * config.hourly_cost();

    Cost {
        cpu_cost: uptime_cost * (cpu_usage / config.total_cpu() as f64),
        memory_cost: uptime_cost * (memory_usage / config.total_memory() as f64),
    }
}

/// Build the outbound point for `point`.
///
/// The result shares the input's timestamp, tags and routing context; its
/// only fields are `cpu_cost` and `memory_cost`.
pub fn transform(point: &Point, config: &CostConfig) -> Point {
    let cost = compute(
        point.int_field(CPU_FIELD) as f64,
        point.int_field(MEMORY_FIELD) as f64,
        point.int_field(UPTIME_FIELD) as f64,
        config,
    );

    point
        .derive_empty()
        .with_double_field(CPU_COST_FIELD, cost.cpu_cost)
        .with_double_field(MEMORY_COST_FIELD, cost.memory_cost)
}
