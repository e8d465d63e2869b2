//! Solver selection.
//!
//! Instances without any window bound go to the fast TSP solver. Everything
//! else goes to a constrained backend picked by the configured
//! [`BackendPolicy`].

use std::fmt;

use tracing::debug;

use crate::config::OptimizerConfig;
use crate::domain::Instance;

/// Encoding family shared by a group of solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// No window carries a bound: TSPLIB in, JSON tour out.
    Unconstrained,
    /// At least one bound present: VRPTW text in, integer lines out.
    Constrained,
}

/// A concrete solver program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Fast,
    Primary,
    Fallback,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Fast => "fast",
            Backend::Primary => "primary",
            Backend::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub family: Family,
    pub backend: Backend,
}

/// Chooses between the two constrained backends.
///
/// Implementations must be pure: the same instance always gets the same backend.
pub trait BackendPolicy: Send + Sync + fmt::Debug {
    fn choose(&self, instance: &Instance) -> Backend;
}

/// Always the primary constrained solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferPrimary;

impl BackendPolicy for PreferPrimary {
    fn choose(&self, _instance: &Instance) -> Backend {
        Backend::Primary
    }
}

/// Always the fallback constrained solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferFallback;

impl BackendPolicy for PreferFallback {
    fn choose(&self, _instance: &Instance) -> Backend {
        Backend::Fallback
    }
}

/// Fallback for instances with more than `nodes` matrix rows, primary otherwise.
#[derive(Debug, Clone, Copy)]
pub struct FallbackAbove {
    pub nodes: usize,
}

impl BackendPolicy for FallbackAbove {
    fn choose(&self, instance: &Instance) -> Backend {
        if instance.size() > self.nodes {
            Backend::Fallback
        } else {
            Backend::Primary
        }
    }
}

/// Picks the constrained backend for `instance` using the configured policy.
pub fn choose_constrained_backend(instance: &Instance, config: &OptimizerConfig) -> Backend {
    config.backend_policy.choose(instance)
}

/// Picks the solver family and backend for `instance`.
pub fn select(instance: &Instance, config: &OptimizerConfig) -> Dispatch {
    if instance.is_unconstrained() {
        debug!(nodes = instance.size(), "No constraints detected");
        Dispatch {
            family: Family::Unconstrained,
            backend: Backend::Fast,
        }
    } else {
        let backend = choose_constrained_backend(instance, config);
        debug!(nodes = instance.size(), %backend, "Constraints detected");
        Dispatch {
            family: Family::Constrained,
            backend,
        }
    }
}
