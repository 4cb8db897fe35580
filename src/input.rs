//! Line reading that never pulls more bytes off a descriptor than the line
//! it returns. A heredoc writer forked after a command line has been read
//! must find the following lines still unread on stdin.

use nix::errno::Errno;
use nix::unistd;
use std::io::{self, Read};

#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
	Line(String),
	TooLong,
	Eof,
}

/// Unbuffered reader over the shell's own standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		loop {
			match unistd::read(libc::STDIN_FILENO, buf) {
				Err(Errno::EINTR) => continue,
				r => return r.map_err(io::Error::from),
			}
		}
	}
}

/// Reads one line byte by byte, without the terminator. A line of more
/// than `max` bytes is consumed up to its end and reported as `TooLong`.
pub fn read_line<R: Read>(reader: &mut R, max: Option<usize>) -> io::Result<ReadLine> {
	let mut line: Vec<u8> = vec![];
	let mut overflow = false;
	let mut byte = [0u8; 1];
	let mut got_any = false;
	loop {
		if reader.read(&mut byte)? == 0 {
			break;
		}
		got_any = true;
		if byte[0] == b'\n' {
			break;
		}
		if overflow {
			continue;
		}
		line.push(byte[0]);
		if max.map_or(false, |m| line.len() > m) {
			overflow = true;
			line.clear();
		}
	}
	if !got_any {
		return Ok(ReadLine::Eof);
	}
	if overflow {
		return Ok(ReadLine::TooLong);
	}
	if line.last() == Some(&b'\r') {
		line.pop();
	}
	Ok(ReadLine::Line(String::from_utf8_lossy(&line).into_owned()))
}
