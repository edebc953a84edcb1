use crate::{
    api::octopus::TariffData,
    core::schedule::PriceSchedule,
    prelude::*,
    store::{Key, Store},
};

/// Cached view over the persisted tariff snapshot.
///
/// The snapshot is loaded from the store at most once per run; [`Self::refresh`]
/// replaces it wholesale after a successful fetch. A payload that fails
/// validation never reaches the store, so the previous snapshot survives a
/// bad fetch byte for byte.
pub struct PriceFeed<'a, S> {
    store: &'a S,
    snapshot: Option<Option<TariffData>>,
}

impl<'a, S: Store> PriceFeed<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store, snapshot: None }
    }

    /// Build the time-ordered schedule from the cached snapshot.
    ///
    /// An absent or unparsable snapshot degrades to an empty schedule: the
    /// decision rules treat missing prices as unknown rather than failing
    /// the whole run.
    pub fn schedule(&mut self) -> PriceSchedule {
        let store = self.store;
        self.snapshot
            .get_or_insert_with(|| Self::load(store))
            .as_ref()
            .map(PriceSchedule::from)
            .unwrap_or_default()
    }

    /// Validate a freshly fetched payload and persist it verbatim as the new
    /// snapshot.
    pub fn refresh(&mut self, body: &str) -> Result {
        TariffData::parse(body)?;
        self.store.save_raw(Key::TariffData, body)?;
        self.invalidate();
        Ok(())
    }

    /// Drop the in-process copy so that the next query reloads from the store.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    fn load(store: &S) -> Option<TariffData> {
        match store.load_raw(Key::TariffData) {
            Ok(Some(raw)) => match TariffData::parse(&raw) {
                Ok(data) => Some(data),
                Err(error) => {
                    warn!("ignoring the unparsable tariff snapshot: {error:#}");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!("failed to read the tariff snapshot: {error:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::octopus::FetchError, store::MemoryStore};

    // language=json
    const BODY: &str = r#"{"results": [
        {"valid_from": "2026-01-15T22:00:00Z", "value_inc_vat": 5.0},
        {"valid_from": "2026-01-15T22:30:00Z", "value_inc_vat": 3.0}
    ]}"#;

    #[test]
    fn absent_snapshot_yields_an_empty_schedule() {
        let store = MemoryStore::default();
        assert!(PriceFeed::new(&store).schedule().is_empty());
    }

    #[test]
    fn unparsable_snapshot_yields_an_empty_schedule() -> Result {
        let store = MemoryStore::default();
        store.save_raw(Key::TariffData, "certainly not JSON")?;
        assert!(PriceFeed::new(&store).schedule().is_empty());
        Ok(())
    }

    #[test]
    fn refresh_replaces_the_snapshot() -> Result {
        let store = MemoryStore::default();
        let mut feed = PriceFeed::new(&store);
        assert!(feed.schedule().is_empty());
        feed.refresh(BODY)?;
        assert_eq!(feed.schedule().len(), 2);
        assert_eq!(store.load_raw(Key::TariffData)?.as_deref(), Some(BODY));
        Ok(())
    }

    #[test]
    fn malformed_refresh_leaves_the_snapshot_intact() -> Result {
        let store = MemoryStore::default();
        store.save_raw(Key::TariffData, BODY)?;
        let mut feed = PriceFeed::new(&store);

        let error = feed.refresh(r#"{"results": ["#).unwrap_err();
        assert!(matches!(error.downcast_ref::<FetchError>(), Some(FetchError::Malformed(_))));
        assert_eq!(store.load_raw(Key::TariffData)?.as_deref(), Some(BODY));
        assert_eq!(feed.schedule().len(), 2);
        Ok(())
    }
}
