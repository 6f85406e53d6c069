//! Attaching validation messages to result headers.

use tracing::debug;

use catalog_entity::lifecycle::{EntityHeader, ValidationMessages};

/// Attach `messages` to `header` when at least one published or scheduled
/// language of the header has a violation.
///
/// Violations that only concern Draft languages are not attached. When
/// attached, the full per-language map is kept so the caller sees every
/// unresolved rule of the entity.
pub fn validated_header(mut header: EntityHeader, messages: ValidationMessages) -> EntityHeader {
    let violated = messages.languages();
    let relevant = header
        .published_or_scheduled_languages()
        .iter()
        .any(|language| violated.contains(language));

    if relevant {
        debug!(
            entity_id = %header.id,
            violations = messages.len(),
            "Attaching validation messages"
        );
        header.validation_messages = Some(messages);
    }
    header
}
