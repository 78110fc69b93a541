use crate::{NotificationEvent, NotificationLevel, NotificationSink};

use std::sync::Arc;

use sysinfo::System;

const UNKNOWN_HOST: &str = "unknown";

/// Cheap-to-clone handle every component uses to report what it is doing.
#[derive(Clone)]
pub struct Notifier {
    source_tag: Arc<str>,
    host_identity: Arc<str>,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(
        source_tag: impl Into<Arc<str>>,
        host_identity: impl Into<Arc<str>>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            source_tag: source_tag.into(),
            host_identity: host_identity.into(),
            sink,
        }
    }

    /// Hostname as reported by the OS, lowercased and trimmed.
    pub fn os_host_identity() -> String {
        System::host_name()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| String::from(UNKNOWN_HOST))
    }

    pub fn host_identity(&self) -> &str {
        &self.host_identity
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.sink.emit(NotificationEvent {
            source_tag: self.source_tag.to_string(),
            level,
            message: message.into(),
            host_identity: self.host_identity.to_string(),
        });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn alert(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Alert, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Fatal, message);
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("source_tag", &self.source_tag)
            .field("host_identity", &self.host_identity)
            .finish_non_exhaustive()
    }
}
