use crate::NotificationLevel;

/// One noteworthy action, as handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub source_tag: String,
    pub level: NotificationLevel,
    pub message: String,
    pub host_identity: String,
}

impl NotificationEvent {
    /// Line-oriented wire form: `({host}): {tag} {Level} {message}`.
    ///
    /// `>` is rewritten to `(gt)` so a collector never mistakes message text
    /// for a syslog priority field.
    pub fn to_line(&self) -> String {
        format!(
            "({}): {} {} {}",
            self.host_identity, self.source_tag, self.level, self.message
        )
        .replace('>', "(gt)")
    }
}
