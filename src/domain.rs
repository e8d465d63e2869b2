//! Instance model for the TSPTW optimizer.
//!
//! # Overview
//!
//! - [`Instance`]: validated routing problem handed to the solve layer
//! - [`Window`]: time or rest window with optional bounds
//! - [`SolveResult`]: normalized solver output
//!
//! Instances are built per request and never shared.

use serde::Serialize;
use serde_json::Number;

/// Latest bound written for an absent upper bound; solvers read it as "no limit".
pub const INFINITE_TIME: i64 = i32::MAX as i64;

/// A `(earliest?, latest?, service_duration)` window.
///
/// Values are JSON numbers and keep the form they arrived in, so `3600.5`
/// reaches the solver as `3600.5` and `3600` as `3600`.
///
/// # Examples
///
/// ```
/// use optimizer_api::domain::Window;
/// use serde_json::Number;
///
/// let open = Window::default();
/// assert!(open.is_unbounded());
/// assert_eq!(open.bounds(), (Number::from(0), Number::from(2_147_483_647)));
///
/// let morning = Window::new(Some(8 * 3600), Some(12 * 3600), 300);
/// assert!(!morning.is_unbounded());
/// assert_eq!(morning.bounds(), (Number::from(28_800), Number::from(43_200)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub earliest: Option<Number>,
    pub latest: Option<Number>,
    pub service_duration: Number,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            earliest: None,
            latest: None,
            service_duration: Number::from(0),
        }
    }
}

impl Window {
    /// Window with whole-number bounds.
    pub fn new(earliest: Option<i64>, latest: Option<i64>, service_duration: i64) -> Self {
        Self {
            earliest: earliest.map(Number::from),
            latest: latest.map(Number::from),
            service_duration: Number::from(service_duration),
        }
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.earliest.is_none() && self.latest.is_none()
    }

    /// Bounds with absent values replaced by `0` and [`INFINITE_TIME`].
    pub fn bounds(&self) -> (Number, Number) {
        (
            self.earliest.clone().unwrap_or_else(|| Number::from(0)),
            self.latest.clone().unwrap_or_else(|| Number::from(INFINITE_TIME)),
        )
    }
}

/// One matrix cell: weight components from node `i` to node `j`.
///
/// The first component is the travel cost; constrained solvers also read
/// the remaining components (typically `[time, distance]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell(Vec<Number>);

impl Cell {
    /// Returns `None` for a cell without components.
    pub fn new(components: Vec<Number>) -> Option<Self> {
        if components.is_empty() {
            None
        } else {
            Some(Self(components))
        }
    }

    pub fn cost(&self) -> &Number {
        &self.0[0]
    }

    pub fn components(&self) -> &[Number] {
        &self.0
    }
}

/// A validated routing problem.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Square matrix, `matrix[i][j]` from node `i` to node `j`.
    pub matrix: Vec<Vec<Cell>>,
    /// One window per node, aligned with matrix rows.
    pub time_window: Vec<Window>,
    /// Breaks not tied to a node.
    pub rest_window: Vec<Window>,
    /// Accepted for forward compatibility; no encoder reads it.
    pub capacity: Option<serde_json::Value>,
    /// Solver time limit in milliseconds.
    pub time_limit: Option<u64>,
    pub soft_upper_bound: Option<u64>,
}

impl Instance {
    /// Number of nodes (matrix rows).
    pub fn size(&self) -> usize {
        self.matrix.len()
    }

    /// All windows, node windows first, then rest windows.
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.time_window.iter().chain(self.rest_window.iter())
    }

    /// True when no window carries a bound.
    pub fn is_unconstrained(&self) -> bool {
        self.windows().all(Window::is_unbounded)
    }
}

/// Normalized solver output.
///
/// Serializes untagged: a tour is `[0, 2, 1]`, routes are `[[0, 10], [1, 25]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SolveResult {
    /// Depot-first, 0-based closed tour from the fast solver.
    Tour(Vec<usize>),
    /// One integer record per output line from a constrained solver.
    Routes(Vec<Vec<i64>>),
}

impl SolveResult {
    pub fn is_empty(&self) -> bool {
        match self {
            SolveResult::Tour(tour) => tour.is_empty(),
            SolveResult::Routes(routes) => routes.is_empty(),
        }
    }

    /// Number of visits across the result.
    pub fn visit_count(&self) -> usize {
        match self {
            SolveResult::Tour(tour) => tour.len(),
            SolveResult::Routes(routes) => routes.iter().map(Vec::len).sum(),
        }
    }
}
