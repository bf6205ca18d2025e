use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Inputs, SimulationOutcome, Trial, Verdict, coverage_ratio, headline, run_simulation, verdict,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "runway",
    about = "Monte Carlo monthly budget risk checker (correlated living costs + emergency shocks)"
)]
struct Cli {
    #[arg(long, default_value_t = 2_500_000.0, help = "Money available this month")]
    budget: f64,
    #[arg(
        long,
        default_value_t = 900_000.0,
        help = "Cheapest plausible monthly food spend"
    )]
    food_min: f64,
    #[arg(long, default_value_t = 1_500_000.0, help = "Typical monthly food spend")]
    food_mode: f64,
    #[arg(
        long,
        default_value_t = 2_400_000.0,
        help = "Most expensive plausible monthly food spend"
    )]
    food_max: f64,
    #[arg(
        long,
        default_value_t = 150_000.0,
        help = "Guaranteed monthly transport spend"
    )]
    transport_floor: f64,
    #[arg(
        long,
        default_value_t = 300_000.0,
        help = "Spread of transport spend above the floor"
    )]
    transport_width: f64,
    #[arg(
        long,
        default_value_t = 12.5,
        help = "Lifestyle log-scale location; exp(mu) is the median lifestyle spend"
    )]
    lifestyle_mu: f64,
    #[arg(long, default_value_t = 0.4, help = "Lifestyle log-scale spread")]
    lifestyle_sigma: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Chance of an emergency expense in percent"
    )]
    shock_probability: f64,
    #[arg(
        long,
        default_value_t = 1_500_000.0,
        help = "Cost of an emergency when it happens"
    )]
    shock_cost: f64,
    #[arg(long, default_value_t = 850_000.0, help = "Average monthly housing cost")]
    housing_mean: f64,
    #[arg(
        long,
        default_value_t = 50_000.0,
        help = "Standard deviation of the housing cost"
    )]
    housing_sd: f64,
    #[arg(
        long,
        default_value_t = 0.7,
        help = "How contagious overspending is across categories (0 to 0.95)"
    )]
    correlation_strength: f64,
    #[arg(long, default_value_t = 10_000)]
    simulations: u32,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    budget: Option<f64>,
    food_min: Option<f64>,
    food_mode: Option<f64>,
    food_max: Option<f64>,
    transport_floor: Option<f64>,
    transport_width: Option<f64>,
    lifestyle_mu: Option<f64>,
    lifestyle_sigma: Option<f64>,
    shock_probability: Option<f64>,
    shock_cost: Option<f64>,
    housing_mean: Option<f64>,
    housing_sd: Option<f64>,
    correlation_strength: Option<f64>,
    simulations: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    verdict: Verdict,
    headline: String,
    budget: f64,
    simulations: u32,
    seed: u64,
    exceedance_probability: f64,
    safe_budget_95: f64,
    budget_gap: f64,
    coverage_ratio: f64,
    trials: Vec<Trial>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    for (name, value) in [
        ("--budget", cli.budget),
        ("--food-min", cli.food_min),
        ("--food-mode", cli.food_mode),
        ("--food-max", cli.food_max),
        ("--transport-floor", cli.transport_floor),
        ("--transport-width", cli.transport_width),
        ("--lifestyle-mu", cli.lifestyle_mu),
        ("--lifestyle-sigma", cli.lifestyle_sigma),
        ("--shock-probability", cli.shock_probability),
        ("--shock-cost", cli.shock_cost),
        ("--housing-mean", cli.housing_mean),
        ("--housing-sd", cli.housing_sd),
        ("--correlation-strength", cli.correlation_strength),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if cli.simulations == 0 {
        return Err("--simulations must be > 0".to_string());
    }

    if !(0.0..=0.95).contains(&cli.correlation_strength) {
        return Err("--correlation-strength must be between 0 and 0.95".to_string());
    }

    if cli.food_min <= 0.0 {
        return Err("--food-min must be > 0".to_string());
    }

    if cli.food_min > cli.food_mode || cli.food_mode > cli.food_max {
        return Err(
            "--food-min, --food-mode and --food-max must satisfy min <= mode <= max".to_string(),
        );
    }

    if cli.food_min == cli.food_max {
        return Err("--food-max must be > --food-min".to_string());
    }

    if cli.transport_floor < 0.0 {
        return Err("--transport-floor must be >= 0".to_string());
    }

    if cli.transport_width <= 0.0 {
        return Err("--transport-width must be > 0".to_string());
    }

    if cli.lifestyle_sigma <= 0.0 {
        return Err("--lifestyle-sigma must be > 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.shock_probability) {
        return Err("--shock-probability must be between 0 and 100".to_string());
    }

    if cli.shock_cost < 0.0 {
        return Err("--shock-cost must be >= 0".to_string());
    }

    if cli.housing_sd < 0.0 {
        return Err("--housing-sd must be >= 0".to_string());
    }

    Ok(Inputs {
        simulations: cli.simulations,
        correlation_strength: cli.correlation_strength,
        food_min: cli.food_min,
        food_mode: cli.food_mode,
        food_max: cli.food_max,
        transport_floor: cli.transport_floor,
        transport_width: cli.transport_width,
        lifestyle_mu: cli.lifestyle_mu,
        lifestyle_sigma: cli.lifestyle_sigma,
        shock_probability: cli.shock_probability / 100.0,
        shock_cost: cli.shock_cost,
        housing_mean: cli.housing_mean,
        housing_sd: cli.housing_sd,
        budget: cli.budget,
        seed: cli.seed,
    })
}

/// One-shot mode: parse the full flag set, run a simulation, and return the
/// response JSON for stdout.
pub fn run_cli<I>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = String>,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let inputs = build_inputs(cli)?;
    let outcome = run_simulation(&inputs).map_err(|e| e.to_string())?;
    let response = build_simulate_response(&inputs, outcome);
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("runway HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let outcome = match run_simulation(&inputs) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    json_response(StatusCode::OK, build_simulate_response(&inputs, outcome))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SimulatePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.budget {
        cli.budget = v;
    }
    if let Some(v) = payload.food_min {
        cli.food_min = v;
    }
    if let Some(v) = payload.food_mode {
        cli.food_mode = v;
    }
    if let Some(v) = payload.food_max {
        cli.food_max = v;
    }
    if let Some(v) = payload.transport_floor {
        cli.transport_floor = v;
    }
    if let Some(v) = payload.transport_width {
        cli.transport_width = v;
    }
    if let Some(v) = payload.lifestyle_mu {
        cli.lifestyle_mu = v;
    }
    if let Some(v) = payload.lifestyle_sigma {
        cli.lifestyle_sigma = v;
    }
    if let Some(v) = payload.shock_probability {
        cli.shock_probability = v;
    }
    if let Some(v) = payload.shock_cost {
        cli.shock_cost = v;
    }
    if let Some(v) = payload.housing_mean {
        cli.housing_mean = v;
    }
    if let Some(v) = payload.housing_sd {
        cli.housing_sd = v;
    }
    if let Some(v) = payload.correlation_strength {
        cli.correlation_strength = v;
    }
    if let Some(v) = payload.simulations {
        cli.simulations = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        budget: 2_500_000.0,
        food_min: 900_000.0,
        food_mode: 1_500_000.0,
        food_max: 2_400_000.0,
        transport_floor: 150_000.0,
        transport_width: 300_000.0,
        lifestyle_mu: 12.5,
        lifestyle_sigma: 0.4,
        shock_probability: 5.0,
        shock_cost: 1_500_000.0,
        housing_mean: 850_000.0,
        housing_sd: 50_000.0,
        correlation_strength: 0.7,
        // The interactive dashboard favors latency over the CLI's depth.
        simulations: 5_000,
        seed: 42,
    }
}

fn build_simulate_response(inputs: &Inputs, outcome: SimulationOutcome) -> SimulateResponse {
    let SimulationOutcome { trials, summary } = outcome;
    SimulateResponse {
        verdict: verdict(&summary),
        headline: headline(&summary, inputs.budget),
        budget: inputs.budget,
        simulations: inputs.simulations,
        seed: inputs.seed,
        exceedance_probability: summary.exceedance_probability,
        safe_budget_95: summary.safe_budget_95,
        budget_gap: summary.budget_gap,
        coverage_ratio: coverage_ratio(&summary, inputs.budget),
        trials,
    }
}
