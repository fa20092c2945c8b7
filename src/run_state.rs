/// Whether the current run is still going.
///
/// `Running -> Over` happens once per run; further hits are ignored until
/// [`RunState::restart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Over,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == RunState::Running
    }

    pub fn is_over(self) -> bool {
        self == RunState::Over
    }

    /// End the run. Returns `true` only for the call that actually ended it.
    pub fn end_run(&mut self) -> bool {
        match self {
            RunState::Running => {
                *self = RunState::Over;
                true
            }
            RunState::Over => false,
        }
    }

    /// Start a new run. Returns `false` if one was already running.
    pub fn restart(&mut self) -> bool {
        match self {
            RunState::Over => {
                *self = RunState::Running;
                true
            }
            RunState::Running => false,
        }
    }
}
