//! Process-wide configuration.
//!
//! Parsed once at startup from flags or `OPTIMIZER_*` environment variables
//! and passed by reference into every solve.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::dispatch::{BackendPolicy, FallbackAbove, PreferFallback, PreferPrimary};

/// Default solver time limit: 30 seconds.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 30_000;

/// Default soft upper bound multiplier passed to constrained solvers.
pub const DEFAULT_SOFT_UPPER_BOUND: u64 = 3;

/// Extra wall-clock time granted to constrained solvers beyond their own limit.
pub const DEFAULT_TIMEOUT_GRACE_MS: u64 = 5_000;

/// Constrained backend used when the size threshold does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConstrainedBackend {
    #[default]
    Primary,
    Fallback,
}

/// Command-line and environment arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "optimizer-api",
    about = "HTTP front end dispatching TSPTW instances to external solvers",
    version
)]
pub struct ConfigArgs {
    /// Address the HTTP server binds to.
    #[arg(long, env = "OPTIMIZER_LISTEN", default_value = "0.0.0.0:7860")]
    pub listen: SocketAddr,
    /// Fast unconstrained TSP solver executable.
    #[arg(long, env = "OPTIMIZER_VROOM_EXEC", default_value = "vroom")]
    pub vroom_exec: PathBuf,
    /// Primary constrained solver executable.
    #[arg(long, env = "OPTIMIZER_OR_TOOLS_EXEC", default_value = "tsp_simple")]
    pub or_tools_exec: PathBuf,
    /// Fallback constrained solver jar.
    #[arg(long, env = "OPTIMIZER_JSPRIT_EXEC", default_value = "jsprit.jar")]
    pub jsprit_exec: PathBuf,
    /// Java launcher used for the fallback solver.
    #[arg(long, env = "OPTIMIZER_JAVA_EXEC", default_value = "java")]
    pub java_exec: PathBuf,
    /// Directory for solver input/output files.
    #[arg(long, env = "OPTIMIZER_TMP_DIR")]
    pub tmp_dir: Option<PathBuf>,
    /// Solver time limit in milliseconds when the request sets none.
    #[arg(long, env = "OPTIMIZER_DEFAULT_TIME", default_value_t = DEFAULT_TIME_LIMIT_MS)]
    pub default_time_ms: u64,
    /// Soft upper bound when the request sets none.
    #[arg(long, env = "OPTIMIZER_SOFT_UPPER_BOUND", default_value_t = DEFAULT_SOFT_UPPER_BOUND)]
    pub soft_upper_bound: u64,
    /// Constrained backend to use.
    #[arg(long, env = "OPTIMIZER_CONSTRAINED_BACKEND", value_enum, default_value_t)]
    pub constrained_backend: ConstrainedBackend,
    /// Route constrained instances with more nodes than this to the fallback solver.
    #[arg(long, env = "OPTIMIZER_FALLBACK_ABOVE_NODES")]
    pub fallback_above_nodes: Option<usize>,
    /// Hard wall-clock limit for the fast solver, in milliseconds.
    #[arg(long, env = "OPTIMIZER_SOLVER_TIMEOUT_MS")]
    pub solver_timeout_ms: Option<u64>,
    /// Grace period added to the constrained time limit before the process is killed.
    #[arg(long, env = "OPTIMIZER_TIMEOUT_GRACE_MS", default_value_t = DEFAULT_TIMEOUT_GRACE_MS)]
    pub timeout_grace_ms: u64,
}

/// Solver executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    pub vroom: PathBuf,
    pub or_tools: PathBuf,
    pub jsprit: PathBuf,
    pub java: PathBuf,
}

impl Default for Executables {
    fn default() -> Self {
        Self {
            vroom: PathBuf::from("vroom"),
            or_tools: PathBuf::from("tsp_simple"),
            jsprit: PathBuf::from("jsprit.jar"),
            java: PathBuf::from("java"),
        }
    }
}

/// Configuration shared read-only by all requests.
///
/// # Examples
///
/// ```
/// use optimizer_api::config::OptimizerConfig;
///
/// let config = OptimizerConfig::default();
/// assert_eq!(config.default_time_limit_ms, 30_000);
/// assert_eq!(config.default_soft_upper_bound, 3);
/// assert!(config.fast_timeout.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub executables: Executables,
    pub tmp_dir: PathBuf,
    pub default_time_limit_ms: u64,
    pub default_soft_upper_bound: u64,
    pub backend_policy: Arc<dyn BackendPolicy>,
    /// Wall-clock limit for the fast solver, which has no limit of its own.
    pub fast_timeout: Option<Duration>,
    /// Added to the constrained time limit to form that process's deadline.
    pub timeout_grace: Duration,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            executables: Executables::default(),
            tmp_dir: std::env::temp_dir(),
            default_time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            default_soft_upper_bound: DEFAULT_SOFT_UPPER_BOUND,
            backend_policy: Arc::new(PreferPrimary),
            fast_timeout: None,
            timeout_grace: Duration::from_millis(DEFAULT_TIMEOUT_GRACE_MS),
        }
    }
}

impl From<ConfigArgs> for OptimizerConfig {
    fn from(args: ConfigArgs) -> Self {
        let backend_policy: Arc<dyn BackendPolicy> = match (args.fallback_above_nodes, args.constrained_backend) {
            (Some(nodes), _) => Arc::new(FallbackAbove { nodes }),
            (None, ConstrainedBackend::Primary) => Arc::new(PreferPrimary),
            (None, ConstrainedBackend::Fallback) => Arc::new(PreferFallback),
        };

        Self {
            executables: Executables {
                vroom: args.vroom_exec,
                or_tools: args.or_tools_exec,
                jsprit: args.jsprit_exec,
                java: args.java_exec,
            },
            tmp_dir: args.tmp_dir.unwrap_or_else(std::env::temp_dir),
            default_time_limit_ms: args.default_time_ms,
            default_soft_upper_bound: args.soft_upper_bound,
            backend_policy,
            fast_timeout: args.solver_timeout_ms.map(Duration::from_millis),
            timeout_grace: Duration::from_millis(args.timeout_grace_ms),
        }
    }
}
