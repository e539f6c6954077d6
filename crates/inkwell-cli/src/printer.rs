//! Plain-text transcript rendering.
//!
//! The terminal is append-only, so [`Printer`] remembers what it already
//! printed and turns each new [`SessionSnapshot`] into just the lines that
//! changed.

use inkwell_app::{Message, Role, SessionSnapshot};

/// Incremental snapshot printer.
#[derive(Debug, Clone)]
pub struct Printer {
    messages: usize,
    last_status: Option<u64>,
    label: &'static str,
    exhausted: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Printer that has shown nothing yet.
    pub fn new() -> Self {
        Self { messages: 0, last_status: None, label: "Disconnected", exhausted: false }
    }

    /// Lines to print for `snapshot`, given everything printed before.
    pub fn lines(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        let label = snapshot.connectivity_label();
        if label != self.label {
            self.label = label;
            lines.push(format!("-- {label} --"));
        }

        // Status keys only grow, so the last printed key marks the boundary
        for status in &snapshot.statuses {
            if self.last_status.is_none_or(|last| status.timestamp > last) {
                self.last_status = Some(status.timestamp);
                lines.push(format!("  ... {}", status.text));
            }
        }

        for message in snapshot.messages.iter().skip(self.messages) {
            lines.push(format_message(message));
        }
        self.messages = self.messages.max(snapshot.messages.len());

        let exhausted = snapshot.is_exhausted();
        if exhausted && !self.exhausted {
            lines.push("-- Gave up reconnecting. Type /reconnect to try again --".to_string());
        }
        self.exhausted = exhausted;

        lines
    }
}

/// One transcript entry as a line of text.
pub fn format_message(message: &Message) -> String {
    if message.is_error() {
        return format!("! {}", message.content);
    }

    match message.role {
        Role::User => format!("you> {}", message.content),
        Role::Assistant => {
            match message.metadata.as_ref().and_then(|m| m.platform.as_deref()) {
                Some(platform) => format!("assistant [{platform}]> {}", message.content),
                None => format!("assistant> {}", message.content),
            }
        },
    }
}
