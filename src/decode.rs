//! Decoders for raw solver output.

use serde::Deserialize;

use crate::error::DecodeError;

/// Fast solver output; only the tour is read.
#[derive(Debug, Deserialize)]
struct TourOutput {
    tour: Option<Vec<u64>>,
}

/// Decodes the fast solver's JSON output into a canonical 0-based tour.
///
/// `size` is the instance's node count; ids in the tour are 1-based.
pub fn decode_tour(raw: &str, size: usize) -> Result<Vec<usize>, DecodeError> {
    let output: TourOutput =
        serde_json::from_str(raw).map_err(|e| DecodeError::Json(e.to_string()))?;
    let tour = output.tour.ok_or(DecodeError::MissingTour)?;

    let ids = tour
        .into_iter()
        .map(|id| {
            if id == 0 || id > size as u64 {
                Err(DecodeError::NodeOutOfRange { id, size })
            } else {
                Ok(id as usize)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    canonicalize_tour(ids, size)
}

/// Rotates a 1-based tour so the depot comes first, fixes its direction and
/// converts it to 0-based ids.
///
/// A tour whose depot successor is the last node id (`size`) runs the other
/// way round and is reversed first.
///
/// # Examples
///
/// ```
/// use optimizer_api::decode::canonicalize_tour;
///
/// assert_eq!(canonicalize_tour(vec![3, 1, 4, 2], 4).unwrap(), vec![0, 2, 1, 3]);
/// assert_eq!(canonicalize_tour(vec![2, 3, 1], 3).unwrap(), vec![0, 1, 2]);
/// ```
pub fn canonicalize_tour(mut tour: Vec<usize>, size: usize) -> Result<Vec<usize>, DecodeError> {
    let mut index = tour
        .iter()
        .position(|&id| id == 1)
        .ok_or(DecodeError::MissingDepot)?;

    if tour[(index + 1) % tour.len()] == size {
        tour.reverse();
        index = tour.len() - index - 1;
    }
    tour.rotate_left(index);

    Ok(tour.into_iter().map(|id| id - 1).collect())
}

/// Decodes constrained solver output: a header line, then one line of
/// integers per record.
///
/// # Examples
///
/// ```
/// use optimizer_api::decode::decode_routes;
///
/// let routes = decode_routes("Cost: 42\n0 10\n1 25\n").unwrap();
/// assert_eq!(routes, vec![vec![0, 10], vec![1, 25]]);
/// ```
pub fn decode_routes(raw: &str) -> Result<Vec<Vec<i64>>, DecodeError> {
    raw.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            line.split_whitespace()
                .map(|token| {
                    token.parse::<i64>().map_err(|_| DecodeError::NotAnInteger {
                        line: n + 1,
                        token: token.to_string(),
                    })
                })
                .collect()
        })
        .collect()
}
