//! One-shot flash messages
//!
//! A mutation leaves a message behind for the next screen; reading it clears
//! it so it is shown exactly once.

use crate::client::Mutation;
use crate::error::ClientError;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Flash {
    slot: Mutex<Option<FlashMessage>>,
}

impl Flash {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, kind: FlashKind, text: String) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(FlashMessage { kind, text });
    }

    pub fn success(&self, text: impl Into<String>) {
        self.set(FlashKind::Success, text.into());
    }

    pub fn error(&self, text: impl Into<String>) {
        self.set(FlashKind::Error, text.into());
    }

    /// Record the outcome of a mutation and hand the result back
    pub fn record<T>(
        &self,
        result: Result<Mutation<T>, ClientError>,
    ) -> Result<Mutation<T>, ClientError> {
        match result {
            Ok(mutation) => {
                self.success(mutation.message.clone());
                Ok(mutation)
            }
            Err(err) => {
                self.error(err.user_message());
                Err(err)
            }
        }
    }

    /// The pending message, removed on read
    pub fn take(&self) -> Option<FlashMessage> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_message_is_read_once() {
        let flash = Flash::new();
        flash.success("Faculty created successfully");

        let message = flash.take().unwrap();
        assert_eq!(message.kind, FlashKind::Success);
        assert_eq!(message.text, "Faculty created successfully");
        assert_eq!(flash.take(), None);
    }

    #[test]
    fn test_latest_message_wins() {
        let flash = Flash::new();
        flash.success("Team created successfully");
        flash.error("Team already exists");
        assert_eq!(flash.take().map(|m| m.kind), Some(FlashKind::Error));
    }

    #[test]
    fn test_record_keeps_the_result() {
        let flash = Flash::new();
        let ok: Result<Mutation<()>, ClientError> = Ok(Mutation {
            message: "Equipment deleted successfully".into(),
            resource: "equipment".into(),
            data: None,
        });
        assert!(flash.record(ok).is_ok());
        assert_eq!(flash.take().unwrap().text, "Equipment deleted successfully");

        let failed: Result<Mutation<()>, ClientError> = Err(ClientError::from_body(
            StatusCode::NOT_FOUND,
            r#"{"error":"Equipment not found: EQ-9"}"#,
        ));
        assert!(flash.record(failed).is_err());
        assert_eq!(
            flash.take(),
            Some(FlashMessage {
                kind: FlashKind::Error,
                text: "Equipment not found: EQ-9".into(),
            })
        );
    }
}
