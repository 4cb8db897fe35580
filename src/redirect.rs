use crate::error::RedirectionError;
use crate::heredoc::HeredocCapture;
use crate::types::*;

use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use std::fs::File;
use std::os::unix::io::{AsRawFd, FromRawFd};

/// Strips the redirection operators out of one command's words.
///
/// Operators are matched left to right, either as a word of their own that
/// consumes the following word as its operand, or glued to the operand
/// (`<<EOF`, `>out.txt`). Files are not opened here: they are
/// recorded as bindings for the child to open. A heredoc is captured now,
/// through `heredoc`, so its body is read before any stage runs.
pub fn resolve(words: &[String], heredoc: &mut dyn HeredocCapture) -> Result<Resolved, RedirectionError> {
	let mut resolved = Resolved::default();
	let mut iter = words.iter();
	while let Some(word) = iter.next() {
		let (typ, attached) = match RedirectType::split_operator(word) {
			Some(split) => split,
			None => {
				resolved.args.push(word.clone());
				continue;
			},
		};
		let operand = if !attached.is_empty() {
			attached
		} else {
			match iter.next() {
				Some(w) if RedirectType::split_operator(w).is_none() => w.as_str(),
				_ => return Err(RedirectionError::MissingOperand { operator: typ.operator() }),
			}
		};
		let source = match typ {
			RedirectType::Heredoc => BindingSource::Pipe(heredoc.capture(operand)?),
			_ => BindingSource::File { path: operand.into(), typ },
		};
		resolved.bindings.push(DescriptorBinding {
			fd: typ.target_fd(),
			source,
			redirect: Redirect { typ, target: operand.to_string() },
		});
	}
	Ok(resolved)
}

fn open_flags(typ: RedirectType) -> OFlag {
	match typ {
		RedirectType::Input | RedirectType::Heredoc => OFlag::O_RDONLY,
		RedirectType::Output => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
		RedirectType::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
	}
}

fn bind_one(binding: DescriptorBinding) -> Result<(), RedirectionError> {
	let failed = |errno| RedirectionError::OpenFailed { path: binding.redirect.target.clone(), errno };
	match binding.source {
		BindingSource::File { ref path, typ } => {
			let fd = fcntl::open(path.as_path(), open_flags(typ), Mode::from_bits_truncate(0o644)).map_err(failed)?;
			if fd != binding.fd {
				unistd::dup2(fd, binding.fd).map_err(failed)?;
				unistd::close(fd).map_err(failed)?;
			}
		},
		BindingSource::Pipe(ref read_end) => {
			unistd::dup2(read_end.as_raw_fd(), binding.fd).map_err(failed)?;
		},
	}
	Ok(())
}

/// Opens the file bindings inside the shell itself, for built-ins, in scan
/// order so a missing input or an unwritable target is still reported.
/// Returns the last file bound to standard output.
pub fn open_for_builtin(bindings: Vec<DescriptorBinding>) -> Result<Option<File>, RedirectionError> {
	let mut stdout = None;
	for binding in bindings {
		if let BindingSource::File { ref path, typ } = binding.source {
			let flags = open_flags(typ) | OFlag::O_CLOEXEC;
			let fd = fcntl::open(path.as_path(), flags, Mode::from_bits_truncate(0o644))
				.map_err(|errno| RedirectionError::OpenFailed { path: binding.redirect.target.clone(), errno })?;
			let file = unsafe { File::from_raw_fd(fd) };
			if binding.fd == libc::STDOUT_FILENO {
				stdout = Some(file);
			}
		}
	}
	Ok(stdout)
}

/// Applies bindings in order onto the calling process's descriptors, so a
/// later binding of the same descriptor wins. Meant for a forked child
/// right before exec.
pub fn apply(bindings: Vec<DescriptorBinding>) -> Result<(), RedirectionError> {
	for binding in bindings {
		bind_one(binding)?;
	}
	Ok(())
}
