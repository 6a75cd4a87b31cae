//! Resource Form Controller — validated creation drafts, POSTed to the
//! collection endpoint and followed by a reload of the paired table.
//!
//! A draft is transient: it exists for the duration of one submission
//! attempt and is rebuilt from the source on the next. Validation is
//! required-field-only, mirroring the server contract — everything else is
//! the server's job, and its verdict is surfaced verbatim.
//!
//! Incomplete drafts never reach the network.

use std::marker::PhantomData;

use log::warn;
use serde_json::{Map, Value};

use crate::api::{ApiClient, ApiError};
use crate::model::{FieldSpec, Record};
use crate::table::{Interaction, TableController};

/// Produces the raw (untrimmed) value for one declared field. The terminal
/// implementation mixes flag-provided values with interactive prompts; tests
/// use a preset map.
pub trait DraftSource {
    fn value(&mut self, field: &FieldSpec) -> String;
}

/// How a submission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Required fields were empty after trimming; no network call was made.
    /// Carries the labels of the offending fields.
    Incomplete(Vec<&'static str>),
    /// Server accepted the draft and the paired table was reloaded. Carries
    /// the server's confirmation message.
    Created(String),
    /// Server rejected the draft; the caller may correct and resubmit.
    Rejected(String),
    /// Transport-level failure; nothing was created.
    Failed(String),
}

pub struct FormController<'a, R: Record> {
    client: &'a ApiClient,
    _record: PhantomData<R>,
}

impl<'a, R: Record> FormController<'a, R> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    /// Collect, validate and submit one draft.
    ///
    /// On success the paired table controller reloads, so the new record's
    /// row appears through the regular fetch cycle rather than an optimistic
    /// insert.
    pub fn submit(
        &self,
        source: &mut dyn DraftSource,
        ui: &mut dyn Interaction,
        table: &mut TableController<'_, R>,
    ) -> SubmitOutcome {
        let mut draft = Map::new();
        let mut missing = Vec::new();

        for field in R::FORM_FIELDS {
            let value = source.value(field).trim().to_string();
            if field.required && value.is_empty() {
                missing.push(field.label);
            }
            draft.insert(field.key.to_string(), Value::String(value));
        }

        if !missing.is_empty() {
            ui.notify("Please fill in all required fields.");
            return SubmitOutcome::Incomplete(missing);
        }

        match self.client.create(R::ENDPOINT, &Value::Object(draft)) {
            Ok(message) => {
                ui.notify(&message);
                table.reload();
                SubmitOutcome::Created(message)
            }
            Err(err @ ApiError::Rejected { .. }) => {
                warn!("POST {} rejected: {err}", R::ENDPOINT);
                ui.notify(&format!("Error: {err}"));
                SubmitOutcome::Rejected(err.to_string())
            }
            Err(err) => {
                warn!("POST {} failed: {err}", R::ENDPOINT);
                ui.notify(&format!("Could not add the {}.", R::NOUN));
                SubmitOutcome::Failed(err.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sensor;
    use crate::table::{RenderTarget, TableSnapshot};

    struct NullTarget;

    impl RenderTarget for NullTarget {
        fn replace(&mut self, _snapshot: &TableSnapshot) {}
    }

    struct Preset(Vec<(&'static str, &'static str)>);

    impl DraftSource for Preset {
        fn value(&mut self, field: &FieldSpec) -> String {
            self.0
                .iter()
                .find(|(key, _)| *key == field.key)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_default()
        }
    }

    struct Silent;

    impl Interaction for Silent {
        fn confirm(&mut self, _question: &str) -> bool {
            true
        }
        fn notify(&mut self, _message: &str) {}
    }

    #[test]
    fn blank_required_field_aborts_before_any_network_call() {
        // Port 9 is discard/unassigned — if the controller did reach the
        // network the transport error would surface as Failed, not
        // Incomplete.
        let client = ApiClient::new("http://127.0.0.1:9", 50);
        let mut target = NullTarget;
        let mut table = TableController::<Sensor>::new(&client, &mut target);
        let form = FormController::<Sensor>::new(&client);

        let mut source = Preset(vec![("type", "DHT11"), ("port_communication", "   ")]);
        let outcome = form.submit(&mut source, &mut Silent, &mut table);

        let SubmitOutcome::Incomplete(missing) = outcome else {
            panic!("expected Incomplete");
        };
        assert!(missing.contains(&"Communication port"));
        assert!(missing.contains(&"Commercial reference"));
        assert_eq!(table.generation(), 0, "no reload may happen on an incomplete draft");
    }

    #[test]
    fn whitespace_only_values_count_as_empty() {
        let client = ApiClient::new("http://127.0.0.1:9", 50);
        let mut target = NullTarget;
        let mut table = TableController::<Sensor>::new(&client, &mut target);
        let form = FormController::<Sensor>::new(&client);

        let mut source = Preset(vec![
            ("type", "  \t "),
            ("port_communication", "COM3"),
            ("reference_commerciale", "AM2302"),
            ("id_piece", "2"),
        ]);
        let outcome = form.submit(&mut source, &mut Silent, &mut table);
        assert_eq!(outcome, SubmitOutcome::Incomplete(vec!["Type"]));
    }
}
