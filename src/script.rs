//! The simulated execution script.
//!
//! The runner does no real orchestration: it walks a fixed sequence of
//! step descriptions on a timer and derives metrics from the step index.
//! Step text and numeric constants are flavor, so they live here as
//! configuration rather than inline in the runner.

use std::time::Duration;

use crate::model::ExecutionMetrics;

/// Default interval between runner ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(2000);

/// Message carried by the `execution_completed` event.
pub const COMPLETION_MESSAGE: &str = "Execution completed successfully!";

/// Message carried by the `execution_stopped` event.
pub const STOP_MESSAGE: &str = "Execution stopped by user";

/// Ordered step script plus the metric progression constants.
///
/// Metrics grow linearly per tick from the base values; the exact
/// constants are arbitrary but fixed, and the default set reproduces the
/// console's market-entry demo run.
#[derive(Debug, Clone)]
pub struct SimulationScript {
    pub steps: Vec<String>,
    pub tick_interval: Duration,
    pub base_tokens: u64,
    pub base_api_calls: u64,
    pub base_cost: f64,
    pub tokens_per_step: u64,
    pub calls_per_step: u64,
    pub cost_per_step: f64,
    pub seconds_per_step: u64,
}

impl Default for SimulationScript {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS.iter().map(|s| s.to_string()).collect(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            base_tokens: 8247,
            base_api_calls: 23,
            base_cost: 1.47,
            tokens_per_step: 234,
            calls_per_step: 2,
            cost_per_step: 0.08,
            seconds_per_step: 8,
        }
    }
}

impl SimulationScript {
    /// Default script with a caller-supplied tick interval.
    pub fn with_interval(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..Default::default()
        }
    }

    /// Number of steps in the script.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Metrics snapshot for a zero-based step index.
    pub fn metrics_at(&self, index: usize) -> ExecutionMetrics {
        let index = index as u64;
        ExecutionMetrics {
            tokens_used: self.base_tokens + index * self.tokens_per_step,
            api_calls: self.base_api_calls + index * self.calls_per_step,
            estimated_cost: self.base_cost + index as f64 * self.cost_per_step,
            duration: index * self.seconds_per_step,
        }
    }

    /// Progress percentage reported with the update for a zero-based step
    /// index. One-based over the script length, so the last update says 100.
    pub fn progress_at(&self, index: usize) -> u8 {
        if self.steps.is_empty() {
            return 100;
        }
        (((index + 1) as f64 / self.len() as f64) * 100.0).round() as u8
    }
}

const DEFAULT_STEPS: [&str; 17] = [
    "Initializing CrewAI execution environment...",
    "Loading configured agents and tasks...",
    "Starting market entry strategy development...",
    "Market Analyst: Beginning competitive landscape analysis...",
    "Strategy Consultant: Analyzing target market demographics...",
    "Research Agent: Collecting market size and growth data...",
    "Market Analyst: Found 47 direct competitors in the space...",
    "Strategy Consultant: Identified 3 key customer segments...",
    "Research Agent: Market size estimated at $2.4B with 12% CAGR...",
    "Market Analyst: Completing SWOT analysis framework...",
    "Strategy Consultant: Developing go-to-market strategies...",
    "Research Agent: Analyzing pricing models and positioning...",
    "Market Analyst: Generating competitive positioning matrix...",
    "Strategy Consultant: Creating customer acquisition funnel...",
    "Research Agent: Finalizing market entry recommendations...",
    "All agents: Collaborating on executive summary...",
    "Execution completed successfully!",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_grow_linearly_from_bases() {
        let script = SimulationScript::default();
        let first = script.metrics_at(0);
        assert_eq!(first.tokens_used, 8247);
        assert_eq!(first.api_calls, 23);
        assert_eq!(first.duration, 0);

        let last = script.metrics_at(16);
        assert_eq!(last.tokens_used, 8247 + 16 * 234);
        assert_eq!(last.api_calls, 23 + 16 * 2);
        assert_eq!(last.duration, 128);
        assert!((last.estimated_cost - (1.47 + 16.0 * 0.08)).abs() < 1e-9);
    }

    #[test]
    fn metrics_are_monotonic_across_the_script() {
        let script = SimulationScript::default();
        for i in 1..script.len() {
            let prev = script.metrics_at(i - 1);
            let cur = script.metrics_at(i);
            assert!(cur.tokens_used >= prev.tokens_used);
            assert!(cur.api_calls >= prev.api_calls);
            assert!(cur.estimated_cost >= prev.estimated_cost);
            assert!(cur.duration >= prev.duration);
        }
    }

    #[test]
    fn progress_hits_100_only_on_the_last_step() {
        let script = SimulationScript::default();
        let mut last = 0u8;
        for i in 0..script.len() {
            let p = script.progress_at(i);
            assert!(p >= last, "progress regressed at step {i}");
            if i + 1 < script.len() {
                assert!(p < 100, "progress hit 100 before the last step");
            }
            last = p;
        }
        assert_eq!(last, 100);
    }
}
