use crate::config::Config;

/// Shell-wide state that outlives a single line.
#[derive(Debug)]
pub struct State {
	pub config: Config,
	pub last_status: i32,
}

impl State {
	pub fn new(config: Config) -> State {
		State { config, last_status: 0 }
	}
}
