//! DTOs for REST API requests/responses.
//!
//! The optimize payload arrives as a JSON string in the `data` form field and
//! is validated into an [`Instance`] before any solver runs.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;

use crate::domain::{Cell, Instance, SolveResult, Window};
use crate::error::RequestError;

/// Form body of `POST /0.1/optimize_tsptw`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OptimizeForm {
    /// JSON-encoded [`OptimizeRequest`].
    pub data: String,
}

/// A matrix cell on the wire: `[time, distance]` or a bare cost.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CellDto {
    Scalar(Number),
    Components(Vec<Number>),
}

/// Optimize payload as sent by clients.
///
/// Windows are `[earliest, latest, service_duration]` with `null` bounds.
/// Matrix and window values may be any JSON number.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub capacity: Option<serde_json::Value>,
    pub matrix: Vec<Vec<CellDto>>,
    #[serde(default)]
    pub time_window: Vec<Vec<Option<Number>>>,
    #[serde(default)]
    pub rest_window: Vec<Vec<Option<Number>>>,
    /// Solver time limit in milliseconds.
    #[serde(default)]
    pub optimize_time: Option<u64>,
    #[serde(default)]
    pub soft_upper_bound: Option<u64>,
}

impl OptimizeRequest {
    /// Parses and validates the `data` field.
    ///
    /// # Examples
    ///
    /// ```
    /// use optimizer_api::dto::OptimizeRequest;
    ///
    /// let data = r#"{
    ///     "capacity": null,
    ///     "matrix": [[[0, 0], [5, 40]], [[6, 45], [0, 0]]],
    ///     "time_window": [[null, null, 0], [3600, null, 300]],
    ///     "rest_window": []
    /// }"#;
    /// let instance = OptimizeRequest::parse(data).unwrap();
    /// assert_eq!(instance.size(), 2);
    /// assert!(!instance.is_unconstrained());
    /// ```
    pub fn parse(data: &str) -> Result<Instance, RequestError> {
        let request: OptimizeRequest =
            serde_json::from_str(data).map_err(|e| RequestError::Json(e.to_string()))?;
        request.to_domain()
    }

    /// Converts the payload to a validated instance.
    ///
    /// An empty `time_window` list means every node is unbounded.
    pub fn to_domain(self) -> Result<Instance, RequestError> {
        let n = self.matrix.len();
        if n == 0 {
            return Err(RequestError::EmptyMatrix);
        }

        let matrix = self
            .matrix
            .into_iter()
            .enumerate()
            .map(|(row, cells)| {
                if cells.len() != n {
                    return Err(RequestError::NotSquare {
                        row,
                        len: cells.len(),
                        expected: n,
                    });
                }
                cells
                    .into_iter()
                    .enumerate()
                    .map(|(col, cell)| {
                        let components = match cell {
                            CellDto::Scalar(v) => vec![v],
                            CellDto::Components(vs) => vs,
                        };
                        Cell::new(components).ok_or(RequestError::EmptyCell { row, col })
                    })
                    .collect()
            })
            .collect::<Result<Vec<Vec<Cell>>, _>>()?;

        let time_window = if self.time_window.is_empty() {
            vec![Window::default(); n]
        } else if self.time_window.len() != n {
            return Err(RequestError::TimeWindowCount {
                len: self.time_window.len(),
                nodes: n,
            });
        } else {
            to_windows("time_window", self.time_window)?
        };
        let rest_window = to_windows("rest_window", self.rest_window)?;

        Ok(Instance {
            matrix,
            time_window,
            rest_window,
            capacity: self.capacity.filter(|c| !c.is_null()),
            time_limit: self.optimize_time,
            soft_upper_bound: self.soft_upper_bound,
        })
    }
}

fn to_windows(field: &'static str, raw: Vec<Vec<Option<Number>>>) -> Result<Vec<Window>, RequestError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let len = entry.len();
            let mut values = entry.into_iter();
            match (values.next(), values.next(), values.next(), values.next()) {
                (Some(earliest), Some(latest), service, None) => Ok(Window {
                    earliest,
                    latest,
                    service_duration: service.flatten().unwrap_or_else(|| Number::from(0)),
                }),
                _ => Err(RequestError::WindowArity { field, index, len }),
            }
        })
        .collect()
}

/// Successful optimize response.
#[derive(Debug, Serialize, ToSchema)]
pub struct OptimizeResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Depot-first 0-based tour, or one integer record per solver line.
    #[schema(value_type = Object)]
    pub optim: SolveResult,
}

impl OptimizeResponse {
    pub fn ok(optim: SolveResult) -> Self {
        Self { status: "ok", optim }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
}
