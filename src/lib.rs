//! Command pipeline engine of the `ish` shell.
//!
//! A line goes through three steps: [`parser::parse`] splits it into a
//! [`types::Pipeline`], [`redirect::resolve`] turns each stage's words into
//! arguments plus descriptor bindings, and [`eval::execute`] forks one
//! process per stage, connects them with pipes and collects every exit
//! status.

pub mod builtin;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod heredoc;
pub mod input;
pub mod job;
pub mod parser;
pub mod prompt;
pub mod redirect;
pub mod spawn;
pub mod types;

#[cfg(test)]
mod test;

/// Serialises tests that touch the process-wide working directory.
#[cfg(test)]
pub(crate) fn cwd_lock() -> std::sync::MutexGuard<'static, ()> {
	static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
	LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
