mod engine;
mod report;
mod sampler;
mod types;

pub use engine::{run_simulation, summarize};
pub use report::{Verdict, coverage_ratio, headline, verdict};
pub use types::{EngineError, Inputs, RiskSummary, SimulationOutcome, Trial};
