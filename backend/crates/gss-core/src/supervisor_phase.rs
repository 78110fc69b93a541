/// Where the supervisor loop currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// Initial install, fingerprint and launch spec assembly
    Bootstrapping,
    /// Steady state: checking for updates and liveness, or sleeping
    Polling,
    /// Wipe-and-reinstall after a failed start
    Reinstalling,
    /// Applying an update found by the staging probe
    Updating,
    /// Spawning the game server
    Starting,
    /// Stop requested and handled
    Stopped,
    /// Fatal error, loop has exited
    Failed { error: String },
}

impl SupervisorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::Polling => "polling",
            Self::Reinstalling => "reinstalling",
            Self::Updating => "updating",
            Self::Starting => "starting",
            Self::Stopped => "stopped",
            Self::Failed { .. } => "failed",
        }
    }
}
