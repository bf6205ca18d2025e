use super::sampler::{MAX_CORRELATION, Rng, correlated_uniforms, derive_seed, inverse_normal_cdf};
use super::types::{EngineError, Inputs, RiskSummary, SimulationOutcome, Trial};

const COPULA_STREAM: u64 = 1;
const HOUSING_STREAM: u64 = 2;
const SHOCK_STREAM: u64 = 3;

/// Runs one full simulation: validates every input up front, draws the
/// correlated cost categories plus the independent housing and shock
/// components, and summarizes the resulting total-cost distribution.
///
/// The batch always has exactly `inputs.simulations` trials, and two runs
/// with the same inputs and seed produce bit-identical batches.
pub fn run_simulation(inputs: &Inputs) -> Result<SimulationOutcome, EngineError> {
    validate(inputs)?;

    let n = inputs.simulations as usize;
    let mut copula_rng = Rng::new(derive_seed(inputs.seed, COPULA_STREAM));
    let mut housing_rng = Rng::new(derive_seed(inputs.seed, HOUSING_STREAM));
    let mut shock_rng = Rng::new(derive_seed(inputs.seed, SHOCK_STREAM));

    let uniforms = correlated_uniforms(&mut copula_rng, n, inputs.correlation_strength)?;
    let food_shape = (inputs.food_mode - inputs.food_min) / (inputs.food_max - inputs.food_min);

    let mut trials = Vec::with_capacity(n);
    for i in 0..n {
        let housing = inputs.housing_mean + inputs.housing_sd * housing_rng.standard_normal();
        let food = triangular_quantile(
            uniforms.food[i],
            inputs.food_min,
            inputs.food_max,
            food_shape,
        );
        let transport = inputs.transport_floor + inputs.transport_width * uniforms.transport[i];
        let lifestyle = (inputs.lifestyle_mu
            + inputs.lifestyle_sigma * inverse_normal_cdf(uniforms.lifestyle[i]))
        .exp();

        // The shock is an exogenous emergency, drawn from its own stream and
        // never routed through the copula.
        let shocked = shock_rng.next_f64() < inputs.shock_probability;
        let shock = if shocked { inputs.shock_cost } else { 0.0 };

        trials.push(Trial {
            total: housing + food + transport + lifestyle + shock,
            shocked,
        });
    }

    let summary = summarize(&trials, inputs.budget);
    Ok(SimulationOutcome { trials, summary })
}

/// Headline risk statistics over a finished batch. Recomputed fresh on every
/// call; nothing is cached.
pub fn summarize(trials: &[Trial], budget: f64) -> RiskSummary {
    if trials.is_empty() {
        return RiskSummary {
            exceedance_probability: 0.0,
            safe_budget_95: 0.0,
            budget_gap: budget,
        };
    }

    let over = trials.iter().filter(|t| t.total > budget).count();
    let mut totals: Vec<f64> = trials.iter().map(|t| t.total).collect();
    let safe_budget_95 = percentile(&mut totals, 95.0);

    RiskSummary {
        exceedance_probability: 100.0 * over as f64 / trials.len() as f64,
        safe_budget_95,
        budget_gap: budget - safe_budget_95,
    }
}

/// Triangular inverse CDF. `shape` is (mode - min) / (max - min), recomputed
/// by the caller whenever the bounds change.
fn triangular_quantile(u: f64, min: f64, max: f64, shape: f64) -> f64 {
    let span = max - min;
    if u < shape {
        min + (u * span * (shape * span)).sqrt()
    } else {
        max - ((1.0 - u) * span * ((1.0 - shape) * span)).sqrt()
    }
}

fn validate(inputs: &Inputs) -> Result<(), EngineError> {
    let invalid = |msg: String| Err(EngineError::InvalidParameter(msg));

    if inputs.simulations == 0 {
        return invalid("simulations must be at least 1".to_string());
    }

    for (name, value) in [
        ("correlation_strength", inputs.correlation_strength),
        ("food_min", inputs.food_min),
        ("food_mode", inputs.food_mode),
        ("food_max", inputs.food_max),
        ("transport_floor", inputs.transport_floor),
        ("transport_width", inputs.transport_width),
        ("lifestyle_mu", inputs.lifestyle_mu),
        ("lifestyle_sigma", inputs.lifestyle_sigma),
        ("shock_probability", inputs.shock_probability),
        ("shock_cost", inputs.shock_cost),
        ("housing_mean", inputs.housing_mean),
        ("housing_sd", inputs.housing_sd),
        ("budget", inputs.budget),
    ] {
        if !value.is_finite() {
            return invalid(format!("{name} must be finite"));
        }
    }

    if !(0.0..=MAX_CORRELATION).contains(&inputs.correlation_strength) {
        return invalid(format!(
            "correlation_strength must be between 0 and {MAX_CORRELATION}"
        ));
    }
    if inputs.food_min <= 0.0 {
        return invalid("food_min must be positive".to_string());
    }
    if inputs.food_min > inputs.food_mode || inputs.food_mode > inputs.food_max {
        return invalid("food bounds must satisfy min <= mode <= max".to_string());
    }
    if inputs.food_min == inputs.food_max {
        return invalid("food_min and food_max must differ".to_string());
    }
    if inputs.transport_floor < 0.0 {
        return invalid("transport_floor must be non-negative".to_string());
    }
    if inputs.transport_width <= 0.0 {
        return invalid("transport_width must be positive".to_string());
    }
    if inputs.lifestyle_sigma <= 0.0 {
        return invalid("lifestyle_sigma must be positive".to_string());
    }
    if !(0.0..=1.0).contains(&inputs.shock_probability) {
        return invalid("shock_probability must be between 0 and 1".to_string());
    }
    if inputs.shock_cost < 0.0 {
        return invalid("shock_cost must be non-negative".to_string());
    }
    if inputs.housing_sd < 0.0 {
        return invalid("housing_sd must be non-negative".to_string());
    }

    Ok(())
}

fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
