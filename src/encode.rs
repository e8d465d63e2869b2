//! Text encoders for solver input files.
//!
//! Both formats are whitespace-delimited ASCII with one record per line.
//! Numbers are written in the form they arrived in, so nothing needs quoting.

use crate::dispatch::Backend;
use crate::domain::{Cell, Instance, Window};

/// Window appended after the node windows for the vehicle start.
fn depot_sentinel() -> Window {
    Window::new(Some(0), None, 0)
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encodes `instance` as a TSPLIB explicit full-matrix ATSP problem.
///
/// Only the first component of each cell is written.
///
/// # Examples
///
/// ```
/// use optimizer_api::domain::{Cell, Instance};
/// use optimizer_api::encode::encode_atsp;
///
/// let cell = |c: i64| Cell::new(vec![c.into(), (c * 100).into()]).unwrap();
/// let instance = Instance {
///     matrix: vec![vec![cell(0), cell(5)], vec![cell(7), cell(0)]],
///     time_window: vec![],
///     rest_window: vec![],
///     capacity: None,
///     time_limit: None,
///     soft_upper_bound: None,
/// };
///
/// let text = encode_atsp(&instance);
/// assert!(text.starts_with("NAME: vroom\nTYPE: ATSP\nDIMENSION: 2\n"));
/// assert!(text.ends_with("EDGE_WEIGHT_SECTION\n0 5\n7 0\nEOF\n"));
/// ```
pub fn encode_atsp(instance: &Instance) -> String {
    let mut lines = vec![
        "NAME: vroom".to_string(),
        "TYPE: ATSP".to_string(),
        format!("DIMENSION: {}", instance.size()),
        "EDGE_WEIGHT_TYPE: EXPLICIT".to_string(),
        "EDGE_WEIGHT_FORMAT: FULL_MATRIX".to_string(),
        "EDGE_WEIGHT_SECTION".to_string(),
    ];
    lines.extend(instance.matrix.iter().map(|row| join(row.iter().map(Cell::cost))));
    lines.push("EOF".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Encodes `instance` in the VRPTW text format read by both constrained solvers.
///
/// Layout: node count, rest window count, one matrix line per row, one
/// `earliest latest service` line per time window, the depot sentinel, then
/// one line per rest window.
pub fn encode_vrptw(instance: &Instance, backend: Backend) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n{}\n", instance.size(), instance.rest_window.len()));

    let rows: Vec<String> = instance
        .matrix
        .iter()
        .map(|row| match backend {
            Backend::Fallback => join(row.iter().flat_map(|cell| cell.components().iter())),
            _ => join(row.iter().map(|cell| join(cell.components()))),
        })
        .collect();
    out.push_str(&rows.join("\n"));
    out.push('\n');

    let node_windows: Vec<String> = instance
        .time_window
        .iter()
        .map(window_line)
        .chain(std::iter::once(window_line(&depot_sentinel())))
        .collect();
    out.push_str(&node_windows.join("\n"));
    out.push('\n');

    let rest_windows: Vec<String> = instance.rest_window.iter().map(window_line).collect();
    out.push_str(&rest_windows.join("\n"));
    out.push('\n');
    out
}

fn window_line(window: &Window) -> String {
    let (earliest, latest) = window.bounds();
    format!("{} {} {}", earliest, latest, window.service_duration)
}
