//! Case-insensitive phrase containment over transcript text.
//!
//! Matching is char-wise so byte offsets stay valid in the original string
//! even for phrases whose lowercase form has a different byte length, and
//! non-ASCII wake words ("클로드") work without special cases. No regex.

use crate::trigger::{AppTrigger, TriggerRoster};

/// Locate `needle` in `haystack` ignoring case. Returns the byte range of
/// the match within the original `haystack`.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in haystack.char_indices() {
        if let Some(len) = prefix_len_ignore_case(&haystack[start..], needle) {
            return Some((start, start + len));
        }
    }
    None
}

/// If `haystack` starts with `needle` (ignoring case), the byte length of
/// the matching prefix of `haystack`.
fn prefix_len_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.char_indices();
    let mut need = needle.chars();
    loop {
        let Some(n) = need.next() else {
            return Some(hay.next().map(|(i, _)| i).unwrap_or(haystack.len()));
        };
        let (_, h) = hay.next()?;
        if !h.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
    }
}

/// A wake word hit: which trigger fired, the phrase as configured, and
/// where the phrase ends in the scanned text.
#[derive(Debug, Clone)]
pub struct WakeMatch {
    pub trigger: AppTrigger,
    pub phrase: String,
    pub match_end: usize,
}

/// Scans transcript revisions against the roster. Held by the controller
/// and rebuilt from a fresh roster snapshot on every `Listening` entry.
#[derive(Debug, Clone, Default)]
pub struct WakeWordMatcher {
    roster: TriggerRoster,
}

impl WakeWordMatcher {
    pub fn new(roster: TriggerRoster) -> Self {
        Self { roster }
    }

    /// First match wins: triggers in registration order, wake words in
    /// configured order within a trigger. Disabled triggers never match.
    pub fn scan(&self, text: &str) -> Option<WakeMatch> {
        for trigger in self.roster.triggers() {
            if !trigger.enabled {
                continue;
            }
            for phrase in &trigger.wake_words {
                if phrase.trim().is_empty() {
                    continue;
                }
                if let Some((start, end)) = find_ignore_case(text, phrase) {
                    tracing::debug!(
                        target: "wake",
                        "wake word {:?} matched for {} at {}..{}",
                        phrase,
                        trigger.id,
                        start,
                        end
                    );
                    return Some(WakeMatch {
                        trigger: trigger.clone(),
                        phrase: phrase.clone(),
                        match_end: end,
                    });
                }
            }
        }
        None
    }

    pub fn roster(&self) -> &TriggerRoster {
        &self.roster
    }
}
