use crate::builtin::{self, Builtin, Flow};
use crate::error::{PipelineError, RedirectionError, ShellError, SpawnError};
use crate::global::State;
use crate::heredoc::HeredocCapture;
use crate::job::ExitStatus;
use crate::parser;
use crate::redirect;
use crate::spawn::{Launch, ProcessBuilder};
use crate::types::*;

use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::unistd;
use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};

/// Resolves every stage up front. A stage that fails keeps its error; it is
/// still spawned and its child reports the error.
pub fn resolve_pipeline(pipeline: &Pipeline, heredoc: &mut dyn HeredocCapture) -> Vec<Result<Resolved, RedirectionError>> {
	pipeline.commands.iter().map(|c| redirect::resolve(&c.words, &mut *heredoc)).collect()
}

/// Spawns every stage left to right, wiring stage `i`'s stdout to stage
/// `i+1`'s stdin, and only then waits for all of them. Returns one status
/// per stage in stage order.
///
/// If a pipe or a process cannot be created, no further stage is spawned;
/// the stages already running are still reaped and their statuses returned
/// inside the error.
pub fn execute<B: ProcessBuilder>(builder: &mut B, stages: Vec<Result<Resolved, RedirectionError>>) -> Result<Vec<ExitStatus>, PipelineError> {
	let len = stages.len();
	let mut handles: Vec<B::Handle> = Vec::with_capacity(len);
	let mut fault: Option<(usize, SpawnError)> = None;
	let mut carried: Option<OwnedFd> = None;

	for (i, plan) in stages.into_iter().enumerate() {
		let is_last = i + 1 == len;
		let (next_read, write) = if is_last {
			(None, None)
		} else {
			match unistd::pipe2(OFlag::O_CLOEXEC) {
				Ok((r, w)) => (Some(r), Some(w)),
				Err(e) => {
					fault = Some((i, SpawnError::Pipe(e)));
					break;
				},
			}
		};
		let close: Vec<RawFd> = [carried.as_ref(), write.as_ref(), next_read.as_ref()]
			.into_iter()
			.flatten()
			.map(AsRawFd::as_raw_fd)
			.collect();
		let launch = Launch {
			stage: i,
			stdin: carried.as_ref().map(AsRawFd::as_raw_fd),
			stdout: write.as_ref().map(AsRawFd::as_raw_fd),
			close,
			plan,
		};
		debug!("spawning stage {} ({:?}) stdin={:?} stdout={:?}",
		       i, launch.program(), launch.stdin, launch.stdout);
		match builder.spawn(launch) {
			Ok(handle) => handles.push(handle),
			Err(e) => {
				fault = Some((i, e));
				break;
			},
		}
		// The child owns its copies now; drop ours so the reader downstream
		// sees end of input once the writer exits.
		drop(write);
		carried = next_read;
	}
	drop(carried);

	let mut statuses = Vec::with_capacity(handles.len());
	for (i, handle) in handles.into_iter().enumerate() {
		match builder.wait(handle) {
			Ok(status) => {
				debug!("stage {} finished: {:?}", i, status);
				statuses.push(status);
			},
			Err(e) => {
				warn!("stage {} could not be reaped: {}", i, e);
				if fault.is_none() {
					fault = Some((i, e));
				}
			},
		}
	}

	match fault {
		None => Ok(statuses),
		Some((stage, source)) => Err(PipelineError { stage, source, reaped: statuses }),
	}
}

fn builtin_of(plan: &Result<Resolved, RedirectionError>) -> Option<Builtin> {
	match *plan {
		Ok(ref r) => r.args.first().and_then(|name| builtin::match_builtin(name)),
		Err(_) => None,
	}
}

/// Runs a built-in in the shell process. Its redirections are opened here;
/// the last `>`/`>>` receives its output.
fn run_builtin(state: &mut State, func: Builtin, resolved: Resolved) -> Result<Flow, ShellError> {
	let Resolved { args, bindings } = resolved;
	let flow = match redirect::open_for_builtin(bindings)? {
		Some(mut file) => func(state, &args[1..], &mut file)?,
		None => func(state, &args[1..], &mut io::stdout())?,
	};
	if let Flow::Continue(s) = flow {
		state.last_status = s;
	}
	Ok(flow)
}

/// Parses and runs one input line: a lone built-in runs in the shell
/// itself, anything else goes through the executor.
pub fn eval_line<B: ProcessBuilder>(state: &mut State, line: &str, builder: &mut B,
                                    heredoc: &mut dyn HeredocCapture) -> Result<Flow, ShellError> {
	let pipeline = parser::parse(line)?;
	let mut stages = resolve_pipeline(&pipeline, heredoc);

	if stages.len() == 1 {
		if let Some(func) = builtin_of(&stages[0]) {
			if let Some(Ok(resolved)) = stages.pop() {
				return run_builtin(state, func, resolved);
			}
		}
	}

	let statuses = execute(builder, stages)?;
	for (i, s) in statuses.iter().enumerate() {
		if !s.success() {
			debug!("stage {} of {:?} exited with {}", i, line, s.code());
		}
	}
	// The last stage decides the pipeline's status.
	state.last_status = statuses.last().map_or(0, |s| s.code());
	Ok(Flow::Continue(state.last_status))
}
