use serde::{Serialize, Serializer};

use crate::models::{StatusKind, StatusMessage};

/// The status region. Every write bumps `epoch` so a delayed auto-clear can
/// tell whether the message it was scheduled for is still the one shown.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    message: Option<StatusMessage>,
    epoch: u64,
}

impl StatusLine {
    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn set(&mut self, kind: StatusKind, text: impl Into<String>) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.message = Some(StatusMessage {
            kind,
            text: text.into(),
        });
        self.epoch
    }

    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.message = None;
    }

    /// Clears only if nothing was written since `epoch`.
    pub fn clear_if_current(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || self.message.is_none() {
            return false;
        }
        self.message = None;
        true
    }
}

impl Serialize for StatusLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.message.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_clear_keeps_newer_message() {
        let mut line = StatusLine::default();
        let first = line.set(StatusKind::Success, "done");
        line.set(StatusKind::Error, "broken");
        assert!(!line.clear_if_current(first));
        assert_eq!(line.message().unwrap().text, "broken");
    }

    #[test]
    fn current_clear_removes_message() {
        let mut line = StatusLine::default();
        let epoch = line.set(StatusKind::Success, "done");
        assert!(line.clear_if_current(epoch));
        assert!(line.message().is_none());
    }

    #[test]
    fn serializes_as_plain_message() {
        let mut line = StatusLine::default();
        line.set(StatusKind::Error, "x");
        let v = serde_json::to_value(&line).unwrap();
        assert_eq!(v, serde_json::json!({ "kind": "error", "text": "x" }));
    }
}
