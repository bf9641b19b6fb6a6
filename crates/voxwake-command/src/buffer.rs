//! Accumulates and diffs command text while a session awaits its
//! execution word.
//!
//! The buffer lives exactly as long as the machine is in
//! `AwaitingCommand`: created on a wake-word match, destroyed on finalize
//! or reset. It survives recognition-session renewals by committing the
//! text captured so far and treating post-renewal revisions as a new
//! segment appended to it.

use tracing::debug;
use voxwake_trigger::{find_ignore_case, AppTrigger, DeliveryMode};

/// What a revision did to the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferEvent {
    /// New text to deliver. In `Replace` mode this is the full clean text;
    /// in `Incremental` mode it is only the fresh delta.
    Updated { text: String },
    /// An execution word closed the capture. `command` is the text before
    /// the execution word, trimmed; the word itself and anything after it
    /// are stripped.
    Finalized { command: String },
}

pub struct CommandBuffer {
    trigger: AppTrigger,
    /// The wake phrase that opened this session; command text starts
    /// after its first occurrence (case-insensitive) in each revision.
    wake_phrase: String,
    /// Clean text preserved across engine renewals and utterance breaks.
    committed: String,
    /// Clean text of the live recognition segment.
    current: String,
    /// Full text already delivered downstream (incremental mode).
    published: String,
}

impl CommandBuffer {
    pub fn new(trigger: AppTrigger, wake_phrase: String) -> Self {
        Self {
            trigger,
            wake_phrase,
            committed: String::new(),
            current: String::new(),
            published: String::new(),
        }
    }

    pub fn trigger(&self) -> &AppTrigger {
        &self.trigger
    }

    /// Everything captured so far, wake word stripped, segments joined.
    pub fn clean_text(&self) -> String {
        match (self.committed.is_empty(), self.current.is_empty()) {
            (true, _) => self.current.clone(),
            (_, true) => self.committed.clone(),
            (false, false) => format!("{} {}", self.committed, self.current),
        }
    }

    /// Fold the live segment into the committed prefix. Called when the
    /// recognition session is renewed or the engine finalizes an
    /// utterance; revisions after this point start from empty text and
    /// must not erase what was already captured.
    pub fn commit_segment(&mut self) {
        let full = self.clean_text();
        debug!(target: "command", "committing segment, {} chars preserved", full.len());
        self.committed = full;
        self.current.clear();
    }

    /// Feed one transcript revision. Returns the delivery event it
    /// produced, if any.
    pub fn on_revision(&mut self, text: &str) -> Option<BufferEvent> {
        // The command starts after the wake phrase (first occurrence);
        // anything spoken before it is pre-wake chatter, not command text.
        let segment = match find_ignore_case(text, &self.wake_phrase) {
            Some((_, end)) => &text[end..],
            None => text,
        };
        self.current = segment.trim().to_string();

        let full = self.clean_text();
        if let Some((pos, word)) = find_execution_word(&full, &self.trigger.execution_words) {
            let command = full[..pos].trim().to_string();
            debug!(
                target: "command",
                "execution word {:?} closed capture for {}",
                word,
                self.trigger.id
            );
            return Some(BufferEvent::Finalized { command });
        }

        // Nothing captured yet. Delivering "" would wipe the target's
        // field, and field clearing is explicit-only.
        if full.is_empty() {
            return None;
        }

        match self.trigger.delivery {
            DeliveryMode::Replace => Some(BufferEvent::Updated { text: full }),
            DeliveryMode::Incremental => {
                let delta = if full.starts_with(&self.published) {
                    full[self.published.len()..].to_string()
                } else {
                    // The source revised backward; resynchronize by
                    // treating the new text as a fresh baseline.
                    debug!(target: "command", "backward revision, resyncing delta tracker");
                    full.clone()
                };
                if delta.is_empty() {
                    return None;
                }
                self.published = full;
                Some(BufferEvent::Updated { text: delta })
            }
        }
    }

    /// Whatever partial text has accumulated; the finalization payload for
    /// idle timeout and manual resets. May be empty.
    pub fn take_partial(&self) -> String {
        self.clean_text().trim().to_string()
    }
}

/// Earliest execution-word occurrence wins; ties at the same position are
/// broken by configured order.
fn find_execution_word<'a>(text: &str, words: &'a [String]) -> Option<(usize, &'a str)> {
    let mut best: Option<(usize, &'a str)> = None;
    for word in words {
        if word.trim().is_empty() {
            continue;
        }
        if let Some((start, _)) = find_ignore_case(text, word) {
            match best {
                Some((found, _)) if found <= start => {}
                _ => best = Some((start, word)),
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(mode: DeliveryMode) -> AppTrigger {
        AppTrigger {
            id: "claude".into(),
            name: "Claude".into(),
            wake_words: vec!["claude".into(), "클로드".into()],
            execution_words: vec!["execute".into(), "go".into()],
            delivery: mode,
            enabled: true,
        }
    }

    fn buffer(mode: DeliveryMode) -> CommandBuffer {
        CommandBuffer::new(trigger(mode), "claude".into())
    }

    #[test]
    fn strips_wake_phrase_and_trims() {
        let mut buf = buffer(DeliveryMode::Replace);
        let event = buf.on_revision("Claude write a haiku").unwrap();
        assert_eq!(
            event,
            BufferEvent::Updated {
                text: "write a haiku".into()
            }
        );
    }

    #[test]
    fn strips_only_first_occurrence_of_wake_phrase() {
        let mut buf = buffer(DeliveryMode::Replace);
        let event = buf.on_revision("claude tell claude something").unwrap();
        assert_eq!(
            event,
            BufferEvent::Updated {
                text: "tell claude something".into()
            }
        );
    }

    #[test]
    fn drops_speech_before_the_wake_phrase() {
        let mut buf = buffer(DeliveryMode::Replace);
        let event = buf.on_revision("um hey Claude open mail").unwrap();
        assert_eq!(
            event,
            BufferEvent::Updated {
                text: "open mail".into()
            }
        );
    }

    #[test]
    fn incremental_emits_deltas() {
        let mut buf = buffer(DeliveryMode::Incremental);
        let mut out = Vec::new();
        for text in ["a", "ab", "abc"] {
            if let Some(BufferEvent::Updated { text }) = buf.on_revision(text) {
                out.push(text);
            }
        }
        assert_eq!(out, vec!["a", "b", "c"]);
        assert_eq!(out.concat(), "abc");
    }

    #[test]
    fn replace_emits_full_snapshots() {
        let mut buf = buffer(DeliveryMode::Replace);
        let mut out = Vec::new();
        for text in ["a", "ab", "abc"] {
            if let Some(BufferEvent::Updated { text }) = buf.on_revision(text) {
                out.push(text);
            }
        }
        assert_eq!(out, vec!["a", "ab", "abc"]);
    }

    #[test]
    fn incremental_resyncs_on_backward_revision() {
        let mut buf = buffer(DeliveryMode::Incremental);
        buf.on_revision("hello world");
        let event = buf.on_revision("hello w").unwrap();
        // Shorter than what was published: fresh baseline, no negative delta.
        assert_eq!(
            event,
            BufferEvent::Updated {
                text: "hello w".into()
            }
        );
        let event = buf.on_revision("hello we").unwrap();
        assert_eq!(event, BufferEvent::Updated { text: "e".into() });
    }

    #[test]
    fn incremental_skips_unchanged_revisions() {
        let mut buf = buffer(DeliveryMode::Incremental);
        buf.on_revision("same");
        assert_eq!(buf.on_revision("same"), None);
    }

    #[test]
    fn execution_word_finalizes_and_strips_trailing_text() {
        let mut buf = buffer(DeliveryMode::Replace);
        let event = buf
            .on_revision("claude write a haiku Execute please now")
            .unwrap();
        assert_eq!(
            event,
            BufferEvent::Finalized {
                command: "write a haiku".into()
            }
        );
    }

    #[test]
    fn earliest_execution_word_wins() {
        let mut buf = buffer(DeliveryMode::Replace);
        // "go" appears before "execute"; position beats list order.
        let event = buf.on_revision("claude do it go and then execute").unwrap();
        assert_eq!(
            event,
            BufferEvent::Finalized {
                command: "do it".into()
            }
        );
    }

    #[test]
    fn execution_word_matching_ignores_case() {
        let mut buf = buffer(DeliveryMode::Replace);
        let event = buf.on_revision("claude open the door EXECUTE").unwrap();
        assert_eq!(
            event,
            BufferEvent::Finalized {
                command: "open the door".into()
            }
        );
    }

    #[test]
    fn committed_text_survives_renewal() {
        let mut buf = buffer(DeliveryMode::Replace);
        buf.on_revision("claude hello");
        buf.commit_segment();
        // Post-renewal revisions start from empty engine text.
        let event = buf.on_revision("world").unwrap();
        assert_eq!(
            event,
            BufferEvent::Updated {
                text: "hello world".into()
            }
        );
    }

    #[test]
    fn incremental_does_not_replay_published_text_after_renewal() {
        let mut buf = buffer(DeliveryMode::Incremental);
        buf.on_revision("claude hello");
        buf.commit_segment();
        let event = buf.on_revision("world").unwrap();
        assert_eq!(event, BufferEvent::Updated { text: " world".into() });
    }

    #[test]
    fn execution_word_spanning_committed_text_still_closes() {
        let mut buf = buffer(DeliveryMode::Replace);
        buf.on_revision("claude write a haiku");
        buf.commit_segment();
        let event = buf.on_revision("Execute").unwrap();
        assert_eq!(
            event,
            BufferEvent::Finalized {
                command: "write a haiku".into()
            }
        );
    }

    #[test]
    fn take_partial_returns_accumulated_text() {
        let mut buf = buffer(DeliveryMode::Replace);
        buf.on_revision("claude unfinished thought");
        assert_eq!(buf.take_partial(), "unfinished thought");
    }

    #[test]
    fn empty_clean_text_is_never_delivered() {
        let mut buf = buffer(DeliveryMode::Replace);
        // Revision carries only the wake phrase; nothing to deliver yet.
        assert_eq!(buf.on_revision("Claude"), None);
        assert_eq!(buf.on_revision("claude "), None);
    }

    #[test]
    fn take_partial_may_be_empty() {
        let buf = buffer(DeliveryMode::Replace);
        assert_eq!(buf.take_partial(), "");
    }

    #[test]
    fn non_ascii_wake_phrase_is_stripped() {
        let mut buf = CommandBuffer::new(trigger(DeliveryMode::Replace), "클로드".into());
        let event = buf.on_revision("클로드 write a haiku Execute").unwrap();
        assert_eq!(
            event,
            BufferEvent::Finalized {
                command: "write a haiku".into()
            }
        );
    }
}
