//! Anonymizer trait and record scrubbing.
//!
//! User-authored text must be anonymized before a record leaves the process.
//! The text transform itself is pluggable; `anonymize_record` knows which
//! fields of a serialized tracker hold user text.

use tracksync_types::tracker::ConversationRecord;

/// Irreversible replacement of sensitive substrings with placeholder tokens.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Anonymizer: Send + Sync {
    fn anonymize_text(&self, text: &str) -> String;
}

/// Any pure string function can act as an anonymizer.
impl<F> Anonymizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn anonymize_text(&self, text: &str) -> String {
        self(text)
    }
}

/// Anonymize every user-text field of `record` in place.
///
/// Covers `latest_message.text` and, for each event of kind "user", its
/// `text` and `parse_data.text`.
pub fn anonymize_record<A: Anonymizer + ?Sized>(record: &mut ConversationRecord, anonymizer: &A) {
    if let Some(text) = record
        .latest_message
        .as_mut()
        .and_then(|m| m.text.as_mut())
    {
        *text = anonymizer.anonymize_text(text);
    }

    for event in record.events.iter_mut().filter(|e| e.is_user()) {
        event.rewrite_user_text(|t| anonymizer.anonymize_text(t));
    }
}
