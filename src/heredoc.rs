use crate::error::RedirectionError;
use crate::input::{self, ReadLine};
use crate::job;

use log::debug;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::OwnedFd;

/// Capability used by the resolver for `<<`: collect lines up to the
/// delimiter and hand them back as a readable descriptor.
pub trait HeredocCapture {
	fn capture(&mut self, delimiter: &str) -> Result<OwnedFd, RedirectionError>;
}

/// Captures heredoc bodies in a short-lived child that writes into a pipe.
///
/// The parent drains the pipe into an unlinked temporary file while the
/// writer runs and hands that file out, rewound. A body larger than the
/// pipe buffer (pasted input) therefore cannot block the writer.
pub struct ForkedHeredoc<R> {
	source: R,
	prompt: String,
}

impl<R: Read> ForkedHeredoc<R> {
	pub fn new(source: R, prompt: &str) -> ForkedHeredoc<R> {
		ForkedHeredoc { source, prompt: prompt.to_string() }
	}
}

/// Copies lines from `source` to `sink` until `delimiter` or end of input.
fn copy_lines<R: Read, W: Write>(source: &mut R, sink: &mut W, delimiter: &str, prompt: &str) -> io::Result<()> {
	let mut stderr = io::stderr();
	loop {
		if !prompt.is_empty() {
			let _ = stderr.write_all(prompt.as_bytes());
		}
		let line = match input::read_line(source, None)? {
			ReadLine::Line(line) => line,
			ReadLine::Eof | ReadLine::TooLong => break,
		};
		if line.trim() == delimiter {
			break;
		}
		sink.write_all(line.as_bytes())?;
		sink.write_all(b"\n")?;
	}
	sink.flush()
}

fn io_errno(e: io::Error) -> RedirectionError {
	RedirectionError::Heredoc(Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO)))
}

/// Reads the pipe until the writer closes it; returns the body rewound.
fn drain(read_end: OwnedFd) -> io::Result<File> {
	let mut body = tempfile::tempfile()?;
	io::copy(&mut File::from(read_end), &mut body)?;
	body.seek(SeekFrom::Start(0))?;
	Ok(body)
}

impl<R: Read> HeredocCapture for ForkedHeredoc<R> {
	fn capture(&mut self, delimiter: &str) -> Result<OwnedFd, RedirectionError> {
		let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(RedirectionError::Heredoc)?;
		match unsafe { unistd::fork() }.map_err(RedirectionError::Heredoc)? {
			ForkResult::Parent { child } => {
				drop(write_end);
				let drained = drain(read_end);
				let status = job::wait_pid(child).map_err(|e| RedirectionError::Heredoc(e.errno()))?;
				debug!("heredoc writer {} finished: {:?}", child, status);
				Ok(OwnedFd::from(drained.map_err(io_errno)?))
			},
			ForkResult::Child => {
				drop(read_end);
				let mut sink = File::from(write_end);
				let s = match copy_lines(&mut self.source, &mut sink, delimiter, &self.prompt) {
					Ok(()) => 0,
					Err(e) => {
						let _ = writeln!(io::stderr(), "heredoc: {}", e);
						1
					},
				};
				drop(sink);
				unsafe { libc::_exit(s) }
			},
		}
	}
}
