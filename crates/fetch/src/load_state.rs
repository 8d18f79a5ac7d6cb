/// Lifecycle of one fetch call site.
///
/// A failed fetch returns to [`LoadState::Idle`] rather than
/// [`LoadState::Done`], so the next trigger may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
	#[default]
	Idle,
	Loading,
	Done,
}

impl LoadState {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Loading => "loading",
			Self::Done => "done",
		}
	}

	pub const fn is_idle(self) -> bool {
		matches!(self, Self::Idle)
	}

	pub const fn is_loading(self) -> bool {
		matches!(self, Self::Loading)
	}

	pub const fn is_done(self) -> bool {
		matches!(self, Self::Done)
	}
}
