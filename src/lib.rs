//! TSPTW Optimizer API
//!
//! Solves traveling salesman problems with time windows by dispatching each
//! instance to an external solver program and normalizing its output.
//!
//! # Pipeline
//!
//! - [`dispatch`]: picks the fast TSP solver or a constrained backend
//! - [`encode`]: writes the TSPLIB or VRPTW input text
//! - [`invoke`]: runs the solver process with temp-file I/O and a deadline
//! - [`decode`]: parses the output into a canonical [`SolveResult`](domain::SolveResult)
//!
//! [`solver::solve`] chains these steps; [`api`] exposes them over HTTP.

pub mod api;
pub mod config;
pub mod console;
pub mod decode;
pub mod dispatch;
pub mod domain;
pub mod dto;
pub mod encode;
pub mod error;
pub mod invoke;
pub mod solver;
