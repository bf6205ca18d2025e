use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub simulations: u32,
    pub correlation_strength: f64,
    pub food_min: f64,
    pub food_mode: f64,
    pub food_max: f64,
    pub transport_floor: f64,
    pub transport_width: f64,
    pub lifestyle_mu: f64,
    pub lifestyle_sigma: f64,
    pub shock_probability: f64,
    pub shock_cost: f64,
    pub housing_mean: f64,
    pub housing_sd: f64,
    pub budget: f64,
    pub seed: u64,
}

/// One simulated month: the summed cost of the five categories and whether
/// the emergency shock fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub total: f64,
    pub shocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    /// Share of trials whose total exceeded the budget, in percent.
    pub exceedance_probability: f64,
    /// Interpolated 95th percentile of the simulated totals.
    pub safe_budget_95: f64,
    /// budget minus safe_budget_95; negative means the budget does not cover
    /// the 95% worst case.
    pub budget_gap: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub trials: Vec<Trial>,
    pub summary: RiskSummary,
}
