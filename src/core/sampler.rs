use std::f64::consts::PI;

use super::types::EngineError;

/// Strongest correlation the copula accepts. Beyond this the fixed pairwise
/// weights can push the correlation matrix out of positive definite
/// territory, so stronger values are rejected rather than clamped.
pub const MAX_CORRELATION: f64 = 0.95;

/// Pairwise weights applied to the correlation strength. Lifestyle creep
/// drags food and transport along unevenly: eating out moves with commuting
/// more than either moves with discretionary spending.
const FOOD_TRANSPORT_WEIGHT: f64 = 0.6;
const FOOD_LIFESTYLE_WEIGHT: f64 = 0.4;
const TRANSPORT_LIFESTYLE_WEIGHT: f64 = 0.5;

/// Correlated uniform marginals in (0,1), one value per trial and category.
#[derive(Debug)]
pub struct CorrelatedUniforms {
    pub food: Vec<f64>,
    pub transport: Vec<f64>,
    pub lifestyle: Vec<f64>,
}

/// Lower-triangular Cholesky factor of the 3x3 correlation matrix, in
/// closed form. l11 is always 1 and is left implicit.
struct CopulaFactor {
    l21: f64,
    l22: f64,
    l31: f64,
    l32: f64,
    l33: f64,
}

impl CopulaFactor {
    fn for_strength(r: f64) -> Result<Self, EngineError> {
        let a = FOOD_TRANSPORT_WEIGHT * r;
        let b = FOOD_LIFESTYLE_WEIGHT * r;
        let c = TRANSPORT_LIFESTYLE_WEIGHT * r;

        let l22_sq = 1.0 - a * a;
        if l22_sq <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "correlation strength {r} makes the correlation matrix non-positive-definite"
            )));
        }
        let l22 = l22_sq.sqrt();
        let l32 = (c - a * b) / l22;
        let l33_sq = 1.0 - b * b - l32 * l32;
        if l33_sq <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "correlation strength {r} makes the correlation matrix non-positive-definite"
            )));
        }

        Ok(Self {
            l21: a,
            l22,
            l31: b,
            l32,
            l33: l33_sq.sqrt(),
        })
    }
}

/// Draws `n` triples from a zero-mean multivariate normal with the pairwise
/// structure above, then maps each marginal through the standard normal CDF.
/// The result is three uniform sequences whose rank correlation mirrors the
/// requested strength.
pub fn correlated_uniforms(
    rng: &mut Rng,
    n: usize,
    strength: f64,
) -> Result<CorrelatedUniforms, EngineError> {
    let factor = CopulaFactor::for_strength(strength)?;

    let mut food = Vec::with_capacity(n);
    let mut transport = Vec::with_capacity(n);
    let mut lifestyle = Vec::with_capacity(n);

    for _ in 0..n {
        let z1 = rng.standard_normal();
        let z2 = rng.standard_normal();
        let z3 = rng.standard_normal();

        food.push(normal_cdf(z1));
        transport.push(normal_cdf(factor.l21 * z1 + factor.l22 * z2));
        lifestyle.push(normal_cdf(
            factor.l31 * z1 + factor.l32 * z2 + factor.l33 * z3,
        ));
    }

    Ok(CorrelatedUniforms {
        food,
        transport,
        lifestyle,
    })
}

/// Standard normal cumulative distribution function, Hastings approximation
/// (A&S 26.2.17, error below 7.5e-8). Saturates to exactly 0 or 1 beyond
/// eight standard deviations.
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return 0.5;
    }
    if z >= 8.0 {
        return 1.0;
    }
    if z <= -8.0 {
        return 0.0;
    }

    let (z_abs, negate) = if z < 0.0 { (-z, true) } else { (z, false) };

    const B0: f64 = 0.2316419;
    const B1: f64 = 0.319381530;
    const B2: f64 = -0.356563782;
    const B3: f64 = 1.781477937;
    const B4: f64 = -1.821255978;
    const B5: f64 = 1.330274429;

    let t = 1.0 / (1.0 + B0 * z_abs);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-0.5 * z_abs * z_abs).exp() / (2.0 * PI).sqrt();
    let cdf = 1.0 - pdf * (B1 * t + B2 * t2 + B3 * t3 + B4 * t4 + B5 * t5);

    if negate { 1.0 - cdf } else { cdf }
}

/// Inverse of the standard normal CDF, Acklam's rational approximation
/// (relative error below 1.2e-9). Inputs at the saturated endpoints are
/// nudged inward so the log terms stay finite.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const P_LOW: f64 = 0.02425;

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let p = p.clamp(1e-300, 1.0 - 1e-16);
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        tail(q)
    } else if p > 1.0 - P_LOW {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail(q)
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

/// Derives an independent sub-stream seed so the copula, housing, and shock
/// draws never interleave within the shared base seed.
pub fn derive_seed(base_seed: u64, stream: u64) -> u64 {
    splitmix64(base_seed ^ (stream << 32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

pub struct Rng {
    state: u64,
    cached_normal: Option<f64>,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            seed
        };
        Self {
            state,
            cached_normal: None,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    pub fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        let z0 = r * theta.cos();
        let z1 = r * theta.sin();
        self.cached_normal = Some(z1);
        z0
    }
}
