//! External command channel.
//!
//! Two named slots relay text between Studyroom and an external voice
//! assistant:
//!
//! - `voiceCommand` (inbound): a transcribed command. Whoever consumes it
//!   writes it back empty so the same value is never handled twice.
//! - `webCommand` (outbound): a short feedback phrase, overwritten on each
//!   send and debounced per message by a [`RateLimiter`].
//!
//! The slots live behind [`SlotTransport`], so the channel works the same
//! over the SQLite key-value table or an in-memory map.

mod rate_limit;

pub use rate_limit::{RateLimiter, DEFAULT_DEBOUNCE_MS};

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::error::ChannelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    VoiceCommand,
    WebCommand,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::VoiceCommand => "voiceCommand",
            Slot::WebCommand => "webCommand",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Storage for the two slots. `None` means empty.
pub trait SlotTransport {
    fn read(&self, slot: Slot) -> Result<Option<String>, ChannelError>;
    fn write(&self, slot: Slot, value: Option<&str>) -> Result<(), ChannelError>;
}

impl<T: SlotTransport + ?Sized> SlotTransport for &T {
    fn read(&self, slot: Slot) -> Result<Option<String>, ChannelError> {
        (**self).read(slot)
    }

    fn write(&self, slot: Slot, value: Option<&str>) -> Result<(), ChannelError> {
        (**self).write(slot, value)
    }
}

/// Process-local transport, used by tests and embedders without storage.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    slots: RefCell<HashMap<Slot, String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotTransport for MemoryTransport {
    fn read(&self, slot: Slot) -> Result<Option<String>, ChannelError> {
        Ok(self.slots.borrow().get(&slot).cloned())
    }

    fn write(&self, slot: Slot, value: Option<&str>) -> Result<(), ChannelError> {
        let mut slots = self.slots.borrow_mut();
        match value {
            Some(v) => slots.insert(slot, v.to_string()),
            None => slots.remove(&slot),
        };
        Ok(())
    }
}

/// Rate-limited relay over a [`SlotTransport`].
///
/// Owns its [`RateLimiter`], so two channels never share debounce state.
pub struct CommandChannel<T: SlotTransport> {
    transport: T,
    limiter: RateLimiter,
}

impl<T: SlotTransport> CommandChannel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_limiter(transport, RateLimiter::default())
    }

    pub fn with_limiter(transport: T, limiter: RateLimiter) -> Self {
        Self { transport, limiter }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Write a feedback phrase to `webCommand` unless the same phrase was
    /// sent within the debounce window. Returns whether it was written.
    pub fn send_feedback(&mut self, message: &str, now: DateTime<Utc>) -> Result<bool, ChannelError> {
        if !self.limiter.allow(message, now) {
            tracing::debug!(message, "feedback suppressed by debounce");
            return Ok(false);
        }
        self.transport.write(Slot::WebCommand, Some(message))?;
        self.limiter.mark_sent(message, now);
        Ok(true)
    }

    /// Last phrase written to `webCommand`.
    pub fn last_feedback(&self) -> Result<Option<String>, ChannelError> {
        self.transport.read(Slot::WebCommand)
    }

    /// Pending inbound command, if the slot holds non-blank text.
    pub fn take_command(&self) -> Result<Option<String>, ChannelError> {
        Ok(self
            .transport
            .read(Slot::VoiceCommand)?
            .filter(|text| !text.trim().is_empty()))
    }

    /// Mark the inbound command as consumed.
    pub fn clear_command(&self) -> Result<(), ChannelError> {
        self.transport.write(Slot::VoiceCommand, None)
    }

    /// Place a command in the inbound slot (what the voice assistant does).
    pub fn push_command(&self, text: &str) -> Result<(), ChannelError> {
        self.transport.write(Slot::VoiceCommand, Some(text))
    }
}
