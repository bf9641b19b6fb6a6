//! Application triggers and wake-word matching.

pub mod matcher;
pub mod trigger;

pub use matcher::{find_ignore_case, WakeMatch, WakeWordMatcher};
pub use trigger::{AppTrigger, DeliveryMode, RosterProvider, StaticRoster, TriggerRoster};
