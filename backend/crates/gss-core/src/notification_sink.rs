use crate::NotificationEvent;

/// Destination for notifications.
///
/// Implementations must not block and must not fail the caller; an
/// unreachable collector is the sink's problem, never the supervisor's.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: NotificationEvent);
}

/// Writes every notification to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn emit(&self, event: NotificationEvent) {
        log::log!(target: "gss::notify", event.level.log_level(), "{}", event.to_line());
    }
}
