use crate::error::SpawnError;

use nix::errno::Errno;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::Pid;

/// How a stage ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitStatus {
	Exited(i32),
	Signaled(i32),
}

impl ExitStatus {
	/// Shell-style numeric status; a signal `n` maps to `128 + n`.
	pub fn code(self) -> i32 {
		match self {
			ExitStatus::Exited(c) => c,
			ExitStatus::Signaled(s) => 128 + s,
		}
	}

	pub fn success(self) -> bool {
		self == ExitStatus::Exited(0)
	}
}

trait WaitStatusExt {
	fn terminal(self) -> Option<ExitStatus>;
}

impl WaitStatusExt for WaitStatus {
	fn terminal(self) -> Option<ExitStatus> {
		match self {
			WaitStatus::Exited(_, code) => Some(ExitStatus::Exited(code)),
			WaitStatus::Signaled(_, sig, _) => Some(ExitStatus::Signaled(sig as i32)),
			_ => None,
		}
	}
}

/// A spawned stage that has not been reaped yet.
#[derive(Debug, PartialEq, Eq)]
pub struct ProcessHandle {
	pub pid: Pid,
}

impl SpawnError {
	pub fn errno(&self) -> Errno {
		match *self {
			SpawnError::Pipe(e) | SpawnError::Fork(e) | SpawnError::Wait(e) => e,
		}
	}
}

/// Blocks until `pid` terminates and reaps it.
pub fn wait_pid(pid: Pid) -> Result<ExitStatus, SpawnError> {
	loop {
		match wait::waitpid(pid, None) {
			Ok(status) => {
				if let Some(s) = status.terminal() {
					return Ok(s);
				}
			},
			Err(Errno::EINTR) => {},
			Err(e) => return Err(SpawnError::Wait(e)),
		}
	}
}
