/// Execution classes used to label spawned tasks in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work a user is waiting on: pull requests triggered by scrolling or panning.
	Interactive,
	/// Timers and flushes that run on their own schedule.
	Background,
	/// Long-lived socket drivers and their I/O pumps.
	Network,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Network => "network",
		}
	}
}
