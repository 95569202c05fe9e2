//! The single active record and its contract identifier.

use intake_core::{ContractId, Extraction, Record};

#[derive(Debug)]
struct Active {
    contract_id: ContractId,
    record: Record,
}

/// Holds at most one record under review.
///
/// Loaded wholesale from an extraction; mutated only through the
/// representation synchronizer; emptied on reset.
#[derive(Debug, Default)]
pub struct RecordStore {
    active: Option<Active>,
}

impl RecordStore {
    /// Replace whatever was held with a fresh extraction.
    pub fn load(&mut self, extraction: Extraction) {
        self.active = Some(Active {
            contract_id: extraction.contract_id,
            record: extraction.record,
        });
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn contract_id(&self) -> Option<&ContractId> {
        self.active.as_ref().map(|a| &a.contract_id)
    }

    pub fn record(&self) -> Option<&Record> {
        self.active.as_ref().map(|a| &a.record)
    }

    pub(crate) fn record_mut(&mut self) -> Option<&mut Record> {
        self.active.as_mut().map(|a| &mut a.record)
    }

    /// Copy of the identifier and record for a commit request.
    pub(crate) fn snapshot(&self) -> Option<(ContractId, Record)> {
        self.active
            .as_ref()
            .map(|a| (a.contract_id.clone(), a.record.clone()))
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::Scalar;

    fn extraction(id: &str, name: &str) -> Extraction {
        let mut record = Record::default();
        record.customer_name = Some(Scalar::text(name));
        Extraction {
            contract_id: ContractId::new(id),
            record,
        }
    }

    #[test]
    fn starts_empty() {
        let store = RecordStore::default();
        assert!(!store.is_loaded());
        assert!(store.record().is_none());
        assert!(store.contract_id().is_none());
    }

    #[test]
    fn load_replaces_wholesale() {
        let mut store = RecordStore::default();
        store.load(extraction("c1", "Acme"));
        store.load(extraction("c2", "Globex"));
        assert_eq!(store.contract_id().map(ContractId::as_str), Some("c2"));
        assert_eq!(
            store.record().and_then(|r| r.customer_name.clone()),
            Some(Scalar::text("Globex"))
        );
    }

    #[test]
    fn clear_discards_identifier_and_record() {
        let mut store = RecordStore::default();
        store.load(extraction("c1", "Acme"));
        store.clear();
        assert!(store.snapshot().is_none());
    }
}
