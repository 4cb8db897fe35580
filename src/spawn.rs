use crate::error::{ExecError, RedirectionError, SpawnError};
use crate::job::{self, ExitStatus, ProcessHandle};
use crate::redirect;
use crate::types::Resolved;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, ForkResult};
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::io::RawFd;

/// Everything a child needs before it replaces its image: the pipe ends
/// wired to its standard streams, the descriptors it must close, and the
/// resolved command (or the reason resolution failed).
#[derive(Debug)]
pub struct Launch {
	pub stage: usize,
	pub stdin: Option<RawFd>,
	pub stdout: Option<RawFd>,
	pub close: Vec<RawFd>,
	pub plan: Result<Resolved, RedirectionError>,
}

impl Launch {
	pub fn program(&self) -> Option<&str> {
		match self.plan {
			Ok(ref r) => r.args.first().map(String::as_str),
			Err(_) => None,
		}
	}
}

/// Process creation seam of the executor.
pub trait ProcessBuilder {
	type Handle;

	fn spawn(&mut self, launch: Launch) -> Result<Self::Handle, SpawnError>;
	fn wait(&mut self, handle: Self::Handle) -> Result<ExitStatus, SpawnError>;
}

/// `fork` + `execvp`.
#[derive(Debug, Default)]
pub struct ForkExec;

fn report(e: &dyn std::fmt::Display) {
	let _ = writeln!(io::stderr(), "ish: {}", e);
}

fn exit_child(status: i32) -> ! {
	unsafe { libc::_exit(status) }
}

fn to_argv(args: &[String]) -> Result<Vec<CString>, ExecError> {
	args.iter()
		.map(|a| CString::new(a.as_bytes()).map_err(|_| ExecError::InvalidArgument(a.clone())))
		.collect()
}

fn wire(from: Option<RawFd>, to: RawFd) -> nix::Result<()> {
	if let Some(fd) = from {
		if fd != to {
			unistd::dup2(fd, to)?;
		}
	}
	Ok(())
}

/// Signals the shell ignores for itself; programs get them back.
pub const SHELL_IGNORED: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE];

fn exec_child(launch: Launch, argv: Result<Vec<CString>, ExecError>) -> ! {
	for &sig in &SHELL_IGNORED {
		let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
	}
	let wired = wire(launch.stdin, libc::STDIN_FILENO)
		.and_then(|_| wire(launch.stdout, libc::STDOUT_FILENO));
	if let Err(e) = wired {
		report(&e);
		exit_child(1);
	}
	for &fd in &launch.close {
		if fd > libc::STDERR_FILENO {
			let _ = unistd::close(fd);
		}
	}

	let resolved = match launch.plan {
		Ok(r) => r,
		Err(e) => {
			report(&e);
			exit_child(1);
		},
	};
	if let Err(e) = redirect::apply(resolved.bindings) {
		report(&e);
		exit_child(1);
	}

	let argv = match argv {
		Ok(argv) => argv,
		Err(e) => {
			report(&e);
			exit_child(e.status());
		},
	};
	// Only redirections, nothing to run.
	if argv.is_empty() {
		exit_child(0);
	}
	let program = resolved.args[0].clone();
	let err = match unistd::execvp(&argv[0], &argv) {
		Err(Errno::ENOENT) => ExecError::NotFound(program),
		Err(errno) => ExecError::Failed { program, errno },
		Ok(never) => match never {},
	};
	report(&err);
	exit_child(err.status())
}

impl ProcessBuilder for ForkExec {
	type Handle = ProcessHandle;

	fn spawn(&mut self, launch: Launch) -> Result<ProcessHandle, SpawnError> {
		let argv = match launch.plan {
			Ok(ref r) => to_argv(&r.args),
			Err(_) => Ok(vec![]),
		};
		match unsafe { unistd::fork() }.map_err(SpawnError::Fork)? {
			ForkResult::Parent { child } => Ok(ProcessHandle { pid: child }),
			ForkResult::Child => exec_child(launch, argv),
		}
	}

	fn wait(&mut self, handle: ProcessHandle) -> Result<ExitStatus, SpawnError> {
		job::wait_pid(handle.pid)
	}
}
