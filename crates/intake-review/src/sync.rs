//! Form ↔ raw synchronization for the record under review.
//!
//! The record in [`RecordStore`] and the raw JSON buffer describe the same
//! data. Form edits write one key and rewrite the buffer wholesale, so they
//! leave the two in sync. Raw edits only touch the buffer; the record catches
//! up at checkpoints (leaving the raw view, starting or submitting a
//! confirmation) through [`reparse`]. A failed parse never touches the record.

use intake_core::{FieldKey, Record};
use tracing::debug;

use crate::ReviewError;
use crate::store::RecordStore;
use crate::workflow::Stage;

/// Which representation the operator is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Form,
    Raw,
}

/// Relationship between the raw buffer and the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawStatus {
    /// Buffer is the serialization of the record; the record is authoritative.
    #[default]
    InSync,
    /// Buffer was edited and has not been parsed yet; the buffer is authoritative.
    Edited,
    /// Last parse failed with this reason; the record keeps its last valid value.
    Invalid(String),
}

/// Raw-text representation of the record.
#[derive(Debug, Default)]
pub struct RawBuffer {
    text: String,
    status: RawStatus,
}

impl RawBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> &RawStatus {
        &self.status
    }

    /// Edits are waiting to be parsed into the record.
    pub fn has_pending_edits(&self) -> bool {
        !matches!(self.status, RawStatus::InSync)
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
        self.status = RawStatus::InSync;
    }
}

/// Rewrite the raw buffer from the stored record.
pub fn render_raw(store: &RecordStore, raw: &mut RawBuffer) {
    raw.text = store.record().map(Record::to_raw).unwrap_or_default();
    raw.status = RawStatus::InSync;
}

/// Form → record: write exactly one fixed key, then re-render the buffer.
pub fn apply_field_edit(
    store: &mut RecordStore,
    raw: &mut RawBuffer,
    key: FieldKey,
    value: &str,
) -> Result<(), ReviewError> {
    let Some(record) = store.record_mut() else {
        return Err(ReviewError::NotAllowed {
            action: "edit a field",
            stage: Stage::Idle,
        });
    };
    record.set_text(key, value);
    render_raw(store, raw);
    debug!(field = %key, "form edit applied");
    Ok(())
}

/// Raw edit: replace the buffer only. The record is untouched until [`reparse`].
pub fn apply_raw_edit(raw: &mut RawBuffer, text: impl Into<String>) {
    raw.text = text.into();
    raw.status = RawStatus::Edited;
}

/// Raw → record checkpoint.
///
/// No-op when the buffer is in sync. On success the record is replaced
/// wholesale and the buffer rewritten in canonical form. On failure the
/// record is left alone and the buffer is marked invalid.
pub fn reparse(store: &mut RecordStore, raw: &mut RawBuffer) -> Result<(), ReviewError> {
    if !raw.has_pending_edits() {
        return Ok(());
    }
    match Record::from_raw(&raw.text) {
        Ok(parsed) => {
            if let Some(record) = store.record_mut() {
                *record = parsed;
            }
            render_raw(store, raw);
            debug!("raw edits parsed into record");
            Ok(())
        }
        Err(e) => {
            let reason = e.to_string();
            debug!(reason = %reason, "raw edits rejected");
            raw.status = RawStatus::Invalid(reason.clone());
            Err(ReviewError::InvalidRaw(reason))
        }
    }
}

/// Change the active view. Leaving the raw view is a reparse checkpoint and
/// is refused while the buffer does not parse.
pub fn switch_view(
    view: &mut ViewMode,
    store: &mut RecordStore,
    raw: &mut RawBuffer,
    target: ViewMode,
) -> Result<(), ReviewError> {
    if *view == ViewMode::Raw && target == ViewMode::Form {
        reparse(store, raw)?;
    }
    *view = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{ContractId, Extraction, Scalar};
    use proptest::prelude::*;

    fn loaded() -> (RecordStore, RawBuffer) {
        let mut store = RecordStore::default();
        let mut record = Record::default();
        record.customer_name = Some(Scalar::text("Acme"));
        record
            .extra
            .insert("vendor_name".into(), serde_json::json!("Initech"));
        store.load(Extraction {
            contract_id: ContractId::new("c1"),
            record,
        });
        let mut raw = RawBuffer::default();
        render_raw(&store, &mut raw);
        (store, raw)
    }

    #[test]
    fn render_matches_record() {
        let (store, raw) = loaded();
        assert_eq!(raw.text(), store.record().unwrap().to_raw());
        assert_eq!(raw.status(), &RawStatus::InSync);
    }

    #[test]
    fn field_edit_rewrites_raw() {
        let (mut store, mut raw) = loaded();
        apply_field_edit(&mut store, &mut raw, FieldKey::PlanId, "enterprise").unwrap();
        let reparsed = Record::from_raw(raw.text()).unwrap();
        assert_eq!(&reparsed, store.record().unwrap());
        assert_eq!(reparsed.plan_id, Some(Scalar::text("enterprise")));
        assert_eq!(reparsed.extra["vendor_name"], serde_json::json!("Initech"));
    }

    #[test]
    fn field_edit_without_record_is_refused() {
        let mut store = RecordStore::default();
        let mut raw = RawBuffer::default();
        assert!(apply_field_edit(&mut store, &mut raw, FieldKey::PlanId, "x").is_err());
        assert_eq!(raw.text(), "");
    }

    #[test]
    fn raw_edit_defers_until_reparse() {
        let (mut store, mut raw) = loaded();
        apply_raw_edit(&mut raw, r#"{"customer_name": "Globex", "ramp": []}"#);
        assert_eq!(
            store.record().unwrap().customer_name,
            Some(Scalar::text("Acme"))
        );
        reparse(&mut store, &mut raw).unwrap();
        let record = store.record().unwrap();
        assert_eq!(record.customer_name, Some(Scalar::text("Globex")));
        assert_eq!(record.ramp, Some(vec![]));
        assert!(record.extra.is_empty());
        assert_eq!(raw.status(), &RawStatus::InSync);
        assert_eq!(raw.text(), record.to_raw());
    }

    #[test]
    fn invalid_raw_keeps_record() {
        let (mut store, mut raw) = loaded();
        let before = store.record().unwrap().clone();
        apply_raw_edit(&mut raw, "{ not json");
        let err = reparse(&mut store, &mut raw).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidRaw(_)));
        assert_eq!(store.record().unwrap(), &before);
        assert!(matches!(raw.status(), RawStatus::Invalid(_)));
        assert_eq!(raw.text(), "{ not json");
    }

    #[test]
    fn leaving_raw_with_invalid_text_is_blocked() {
        let (mut store, mut raw) = loaded();
        let mut view = ViewMode::Raw;
        apply_raw_edit(&mut raw, "[1, 2");
        assert!(switch_view(&mut view, &mut store, &mut raw, ViewMode::Form).is_err());
        assert_eq!(view, ViewMode::Raw);

        apply_raw_edit(&mut raw, r#"{"customer_name": "Fixed"}"#);
        switch_view(&mut view, &mut store, &mut raw, ViewMode::Form).unwrap();
        assert_eq!(view, ViewMode::Form);
        assert_eq!(
            store.record().unwrap().customer_name,
            Some(Scalar::text("Fixed"))
        );
    }

    #[test]
    fn entering_raw_never_parses() {
        let (mut store, mut raw) = loaded();
        let mut view = ViewMode::Form;
        switch_view(&mut view, &mut store, &mut raw, ViewMode::Raw).unwrap();
        assert_eq!(view, ViewMode::Raw);
        assert_eq!(raw.status(), &RawStatus::InSync);
    }

    #[test]
    fn form_edit_sequence_roundtrips() {
        let (mut store, mut raw) = loaded();
        let edits = [
            (FieldKey::CustomerEmail, "ap@acme.test"),
            (FieldKey::TermMonths, "12"),
            (FieldKey::TaxPercent, "7.5"),
            (FieldKey::CustomerName, ""),
            (FieldKey::TermMonths, "24"),
        ];
        for (key, value) in edits {
            apply_field_edit(&mut store, &mut raw, key, value).unwrap();
            let parsed = Record::from_raw(raw.text()).unwrap();
            assert_eq!(&parsed, store.record().unwrap());
        }
    }

    fn extra_value() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            any::<i64>().prop_map(serde_json::Value::from),
            any::<bool>().prop_map(serde_json::Value::from),
            "[ -~]{0,12}".prop_map(serde_json::Value::from),
        ]
    }

    proptest! {
        #[test]
        fn prop_form_edits_keep_raw_in_sync(
            extras in prop::collection::vec(("x_[a-z]{1,10}", extra_value()), 0..6),
            edits in prop::collection::vec(
                (prop::sample::select(FieldKey::ALL.to_vec()), any::<String>()),
                0..20,
            ),
        ) {
            let mut record = Record::default();
            record.extra.extend(extras);
            let mut store = RecordStore::default();
            store.load(Extraction {
                contract_id: ContractId::new("c1"),
                record,
            });
            let mut raw = RawBuffer::default();
            render_raw(&store, &mut raw);

            for (key, value) in edits {
                apply_field_edit(&mut store, &mut raw, key, &value).unwrap();
                let parsed = Record::from_raw(raw.text()).unwrap();
                prop_assert_eq!(&parsed, store.record().unwrap());
                prop_assert_eq!(raw.status(), &RawStatus::InSync);
            }
        }
    }
}
