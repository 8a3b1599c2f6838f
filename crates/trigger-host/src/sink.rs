//! Production sinks: JSON lines for notifications, tracing for status

use std::io::{self, Write};

use tracing::info;
use trigger_api::{Notification, NotificationEvent, ProviderStatus};
use trigger_util::TriggerId;

use crate::{HostResult, NotificationSink, StatusReporter};

/// Writes each notification as one `NotificationEvent` JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn emit(&mut self, trigger_id: &TriggerId, notification: &Notification) -> HostResult<()> {
        let envelope = NotificationEvent::new(trigger_id.clone(), notification.clone());
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reports status changes as log events, skipping repeats
#[derive(Debug, Default)]
pub struct LogStatusReporter {
    current: Option<ProviderStatus>,
}

impl LogStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ProviderStatus> {
        self.current
    }
}

impl StatusReporter for LogStatusReporter {
    fn set_status(&mut self, status: ProviderStatus) {
        if self.current == Some(status) {
            return;
        }
        info!(status = %status, "Provider status changed");
        self.current = Some(status);
    }
}
