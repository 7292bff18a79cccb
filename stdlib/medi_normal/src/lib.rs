//! Standard-normal distribution functions for Medi statistics.
//!
//! Provides the CDF `phi` and the quantile `phi_inv`, plus two ways of caching
//! quantile lookups: a caller-owned [`NormalQuantile`] and a process-wide
//! singleton reached through [`cached_phi_inv`].
//!
//! ```
//! use medi_normal::{phi, phi_inv};
//!
//! let z = phi_inv(0.975);
//! assert!((z - 1.959964).abs() < 1e-6);
//! assert!((phi(z) - 0.975).abs() < 1e-9);
//! ```

pub mod cache;

use std::f64::consts::SQRT_2;
use std::sync::{Mutex, PoisonError};

use lazy_static::lazy_static;
use log::trace;
use statrs::function::erf::{erfc, erfc_inv};

pub use cache::QuantileCache;

/// Standard-normal cumulative distribution function.
pub fn phi(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(-x / SQRT_2)
}

/// Standard-normal quantile function.
///
/// Returns `-inf` for `p <= 0` and `+inf` for `p >= 1`.
pub fn phi_inv(p: f64) -> f64 {
    if p.is_nan() {
        f64::NAN
    } else if p <= 0.0 {
        f64::NEG_INFINITY
    } else if p >= 1.0 {
        f64::INFINITY
    } else {
        -SQRT_2 * erfc_inv(2.0 * p)
    }
}

/// Anything able to answer standard-normal quantile queries.
pub trait QuantileSource {
    fn quantile(&mut self, p: f64) -> f64;
}

/// A quantile source owning its own cache.
#[derive(Debug, Default)]
pub struct NormalQuantile {
    cache: QuantileCache,
}

impl NormalQuantile {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: QuantileCache::with_capacity(capacity),
        }
    }

    pub fn cache(&self) -> &QuantileCache {
        &self.cache
    }

    pub fn reset(&mut self) {
        self.cache.clear();
    }
}

impl QuantileSource for NormalQuantile {
    fn quantile(&mut self, p: f64) -> f64 {
        lookup(&mut self.cache, p)
    }
}

lazy_static! {
    static ref GLOBAL_CACHE: Mutex<QuantileCache> = Mutex::new(QuantileCache::default());
}

/// The process-scoped quantile cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalQuantile;

impl QuantileSource for GlobalQuantile {
    fn quantile(&mut self, p: f64) -> f64 {
        cached_phi_inv(p)
    }
}

/// `phi_inv` memoized in the process-wide cache.
pub fn cached_phi_inv(p: f64) -> f64 {
    let mut cache = GLOBAL_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    lookup(&mut cache, p)
}

/// Drop every entry of the process-wide cache.
pub fn reset_global_cache() {
    GLOBAL_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

fn lookup(cache: &mut QuantileCache, p: f64) -> f64 {
    // Endpoints and NaN are cheap and would collide with rounded keys.
    if !(p > 0.0 && p < 1.0) {
        return phi_inv(p);
    }
    if let Some(z) = cache.get(p) {
        return z;
    }
    let z = phi_inv(p);
    trace!("normal quantile miss: p={p} z={z}");
    cache.insert(p, z);
    z
}
