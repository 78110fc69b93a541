use std::fmt;

/// Severity of a notification, as understood by the remote collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    Debug,
    Info,
    Alert,
    Error,
    Fatal,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Alert => "Alert",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    /// Local log level the event is written at.
    pub fn log_level(&self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Alert => log::Level::Warn,
            Self::Error | Self::Fatal => log::Level::Error,
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
