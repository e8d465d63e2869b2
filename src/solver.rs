//! Solve service: dispatch, encode, invoke, decode.
//!
//! Each call owns its instance and temp files; nothing is shared between
//! calls except the read-only [`OptimizerConfig`].

use std::time::{Duration, Instant};

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OptimizerConfig;
use crate::console;
use crate::decode::{decode_routes, decode_tour};
use crate::dispatch::{select, Backend, Dispatch, Family};
use crate::domain::{Instance, SolveResult};
use crate::encode::{encode_atsp, encode_vrptw};
use crate::error::SolveError;
use crate::invoke::{invoke, Invocation, SolverCommand};

/// Why a solve produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoResult {
    /// The solver exited with a non-zero code (or a signal).
    SolverProcessFailed { code: Option<i32> },
    /// The solver was killed at its wall-clock deadline.
    SolverTimedOut,
    /// The solver succeeded but its output holds no visit.
    EmptyResult,
}

/// Outcome of [`solve`] when no error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(SolveResult),
    NoResult(NoResult),
}

/// Tuning parameters after applying configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tuning {
    time_limit_ms: u64,
    soft_upper_bound: u64,
}

impl Tuning {
    fn resolve(instance: &Instance, config: &OptimizerConfig) -> Self {
        Self {
            time_limit_ms: instance.time_limit.unwrap_or(config.default_time_limit_ms),
            soft_upper_bound: instance
                .soft_upper_bound
                .unwrap_or(config.default_soft_upper_bound),
        }
    }
}

/// Builds the argument vector for `backend`.
///
/// # Examples
///
/// ```
/// use optimizer_api::config::OptimizerConfig;
/// use optimizer_api::dispatch::Backend;
/// use optimizer_api::solver::solver_command;
///
/// let config = OptimizerConfig::default();
/// let cmd = solver_command(Backend::Primary, &config, 2000, 3);
/// assert_eq!(
///     cmd.render("/tmp/in"),
///     ["tsp_simple", "-time_limit_in_ms", "2000", "-soft_upper_bound", "3", "-instance_file", "/tmp/in"]
/// );
/// ```
pub fn solver_command(
    backend: Backend,
    config: &OptimizerConfig,
    time_limit_ms: u64,
    soft_upper_bound: u64,
) -> SolverCommand {
    let exec = &config.executables;
    let constrained = |cmd: SolverCommand| {
        cmd.arg("-time_limit_in_ms")
            .arg(time_limit_ms.to_string())
            .arg("-soft_upper_bound")
            .arg(soft_upper_bound.to_string())
            .arg("-instance_file")
            .input_path()
    };

    match backend {
        Backend::Fast => SolverCommand::new(&exec.vroom).arg("-t").arg("-i").input_path(),
        Backend::Primary => constrained(SolverCommand::new(&exec.or_tools)),
        Backend::Fallback => {
            constrained(SolverCommand::new(&exec.java).arg("-jar").arg(&exec.jsprit))
        }
    }
}

/// Wall-clock deadline for the solver process.
fn deadline(dispatch: Dispatch, tuning: Tuning, config: &OptimizerConfig) -> Option<Duration> {
    match dispatch.family {
        Family::Unconstrained => config.fast_timeout,
        // A zero limit means "no limit" to the constrained solvers.
        Family::Constrained if tuning.time_limit_ms == 0 => None,
        Family::Constrained => {
            Some(Duration::from_millis(tuning.time_limit_ms) + config.timeout_grace)
        }
    }
}

/// Solves `instance` with the solver picked by the dispatcher.
///
/// Returns [`SolveOutcome::NoResult`] when the solver fails, times out or
/// yields nothing; errors are reserved for I/O problems and malformed
/// solver output. Temp files are gone when this returns.
pub fn solve(instance: &Instance, config: &OptimizerConfig) -> Result<SolveOutcome, SolveError> {
    let solve_id = Uuid::new_v4();
    let started = Instant::now();
    let dispatch = select(instance, config);
    let tuning = Tuning::resolve(instance, config);

    info!(
        solve_id = %solve_id,
        nodes = instance.size(),
        rests = instance.rest_window.len(),
        family = ?dispatch.family,
        backend = %dispatch.backend,
        "Starting solve"
    );
    console::print_solve_started(instance.size(), instance.rest_window.len(), dispatch.backend);

    let encoded = match dispatch.family {
        Family::Unconstrained => encode_atsp(instance),
        Family::Constrained => encode_vrptw(instance, dispatch.backend),
    };
    let command = solver_command(
        dispatch.backend,
        config,
        tuning.time_limit_ms,
        tuning.soft_upper_bound,
    );

    let invocation = invoke(
        &command,
        &encoded,
        &config.tmp_dir,
        deadline(dispatch, tuning, config),
    )?;

    let outcome = match invocation {
        Invocation::Completed(raw) => {
            let result = match dispatch.family {
                Family::Unconstrained => SolveResult::Tour(decode_tour(&raw, instance.size())?),
                Family::Constrained => SolveResult::Routes(decode_routes(&raw)?),
            };
            if result.is_empty() {
                SolveOutcome::NoResult(NoResult::EmptyResult)
            } else {
                SolveOutcome::Solved(result)
            }
        }
        Invocation::Failed { code } => {
            warn!(solve_id = %solve_id, backend = %dispatch.backend, ?code, "Solver process failed");
            SolveOutcome::NoResult(NoResult::SolverProcessFailed { code })
        }
        Invocation::TimedOut { after } => {
            warn!(
                solve_id = %solve_id,
                backend = %dispatch.backend,
                after_ms = after.as_millis() as u64,
                "Solver timed out"
            );
            SolveOutcome::NoResult(NoResult::SolverTimedOut)
        }
    };

    let elapsed = started.elapsed();
    info!(
        solve_id = %solve_id,
        elapsed_ms = elapsed.as_millis() as u64,
        solved = matches!(outcome, SolveOutcome::Solved(_)),
        "Solve finished"
    );
    console::print_solve_ended(elapsed, dispatch.backend, &outcome);

    Ok(outcome)
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::config::Executables;
    use crate::dispatch::PreferFallback;
    use crate::domain::test_support::instance_of_size;
    use crate::domain::Window;
    use crate::error::DecodeError;
    use crate::invoke::test_support::{fake_solver, leftovers};

    fn config_with(dir: &Path, vroom: &str, or_tools: &str) -> OptimizerConfig {
        OptimizerConfig {
            executables: Executables {
                vroom: fake_solver(dir, "vroom", vroom),
                or_tools: fake_solver(dir, "or-tools", or_tools),
                ..Executables::default()
            },
            tmp_dir: dir.to_path_buf(),
            ..OptimizerConfig::default()
        }
    }

    fn constrained(n: usize) -> Instance {
        let mut windows = vec![Window::default(); n];
        windows[n - 1] = Window::new(Some(100), Some(900), 60);
        instance_of_size(n, windows, vec![])
    }

    #[test]
    fn test_unconstrained_solve_canonicalizes_tour() {
        let dir = TempDir::new().unwrap();
        let config = config_with(dir.path(), r#"echo '{"tour":[3,1,4,2]}'"#, "exit 1");

        let outcome = solve(&instance_of_size(4, vec![], vec![]), &config).unwrap();

        assert_eq!(outcome, SolveOutcome::Solved(SolveResult::Tour(vec![0, 2, 1, 3])));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_fast_solver_reads_tsplib_input() {
        let dir = TempDir::new().unwrap();
        // Echo back a tour only when the input carries the expected header.
        let vroom = r#"grep -q '^DIMENSION: 3$' "$3" && echo '{"tour":[1,2,3]}'"#;
        let config = config_with(dir.path(), vroom, "exit 1");

        let outcome = solve(&instance_of_size(3, vec![], vec![]), &config).unwrap();

        assert_eq!(outcome, SolveOutcome::Solved(SolveResult::Tour(vec![0, 1, 2])));
    }

    #[test]
    fn test_constrained_solve_uses_primary() {
        let dir = TempDir::new().unwrap();
        let or_tools = r#"[ "$1" = "-time_limit_in_ms" ] && [ "$2" = "1500" ] && [ "$4" = "7" ] || exit 2
printf 'Cost: 55\n0 2 1 3\n'"#;
        let config = config_with(dir.path(), "exit 1", or_tools);
        let mut inst = constrained(3);
        inst.time_limit = Some(1500);
        inst.soft_upper_bound = Some(7);

        let outcome = solve(&inst, &config).unwrap();

        assert_eq!(outcome, SolveOutcome::Solved(SolveResult::Routes(vec![vec![0, 2, 1, 3]])));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_fallback_runs_through_java_launcher() {
        let dir = TempDir::new().unwrap();
        let mut config = config_with(dir.path(), "exit 1", "exit 1");
        config.executables.java = fake_solver(
            dir.path(),
            "java",
            r#"[ "$1" = "-jar" ] || exit 2
printf 'Cost: 9\n0 1 2\n'"#,
        );
        config.backend_policy = Arc::new(PreferFallback);

        let outcome = solve(&constrained(2), &config).unwrap();

        assert_eq!(outcome, SolveOutcome::Solved(SolveResult::Routes(vec![vec![0, 1, 2]])));
    }

    #[test]
    fn test_exit_code_one_is_no_result() {
        let dir = TempDir::new().unwrap();
        let config = config_with(dir.path(), "exit 1", "exit 1");

        let fast = solve(&instance_of_size(3, vec![], vec![]), &config).unwrap();
        let slow = solve(&constrained(3), &config).unwrap();

        let expected = SolveOutcome::NoResult(NoResult::SolverProcessFailed { code: Some(1) });
        assert_eq!(fast, expected);
        assert_eq!(slow, expected);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_header_only_output_is_no_result() {
        let dir = TempDir::new().unwrap();
        let config = config_with(dir.path(), "exit 1", "echo 'No solution found...'");

        let outcome = solve(&constrained(3), &config).unwrap();

        assert_eq!(outcome, SolveOutcome::NoResult(NoResult::EmptyResult));
    }

    #[test]
    fn test_malformed_output_errors_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let config = config_with(dir.path(), "echo 'not json'", "printf 'Cost: 1\\n0 zero\\n'");

        let fast = solve(&instance_of_size(3, vec![], vec![]), &config).unwrap_err();
        let slow = solve(&constrained(3), &config).unwrap_err();

        assert!(matches!(fast, SolveError::Decode(DecodeError::Json(_))));
        assert!(matches!(slow, SolveError::Decode(DecodeError::NotAnInteger { .. })));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_fast_solver_deadline() {
        let dir = TempDir::new().unwrap();
        let mut config = config_with(dir.path(), "exec sleep 10", "exit 1");
        config.fast_timeout = Some(Duration::from_millis(200));

        let outcome = solve(&instance_of_size(3, vec![], vec![]), &config).unwrap();

        assert_eq!(outcome, SolveOutcome::NoResult(NoResult::SolverTimedOut));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_constrained_deadline_adds_grace() {
        let config = OptimizerConfig::default();
        let dispatch = Dispatch {
            family: Family::Constrained,
            backend: Backend::Primary,
        };
        let tuning = Tuning {
            time_limit_ms: 2000,
            soft_upper_bound: 3,
        };
        assert_eq!(
            deadline(dispatch, tuning, &config),
            Some(Duration::from_millis(2000) + config.timeout_grace)
        );
        let unlimited = Tuning {
            time_limit_ms: 0,
            ..tuning
        };
        assert_eq!(deadline(dispatch, unlimited, &config), None);
    }

    #[test]
    fn test_fallback_command_line() {
        let config = OptimizerConfig::default();
        let cmd = solver_command(Backend::Fallback, &config, 500, 0);
        assert_eq!(
            cmd.render("/tmp/x"),
            [
                "java",
                "-jar",
                "jsprit.jar",
                "-time_limit_in_ms",
                "500",
                "-soft_upper_bound",
                "0",
                "-instance_file",
                "/tmp/x"
            ]
        );
    }
}
