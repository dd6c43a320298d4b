//! In-memory storage implementation
//!
//! One `DashMap` per aggregate. Every trait method is a single atomic map
//! operation; no lock is held across an `.await`.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::charge_point::{
    ChargePoint, ChargePointRepository, Connector, ConnectorRepository,
};
use crate::domain::charging_profile::{ChargingProfile, ChargingProfileRepository, ProfileFilter};
use crate::domain::configuration::{ConfigurationEntry, ConfigurationRepository};
use crate::domain::firmware::{
    Diagnostics, DiagnosticsRepository, FirmwareUpdate, FirmwareUpdateRepository, LocalAuthList,
    LocalAuthListRepository,
};
use crate::domain::id_tag::{IdTag, IdTagRepository};
use crate::domain::meter_value::{MeterReading, MeterValueRepository};
use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::transaction::{Transaction, TransactionRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// In-memory repositories for development and tests
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    charge_points: InMemoryChargePoints,
    connectors: InMemoryConnectors,
    transactions: InMemoryTransactions,
    reservations: InMemoryReservations,
    charging_profiles: InMemoryChargingProfiles,
    configuration: InMemoryConfiguration,
    id_tags: InMemoryIdTags,
    meter_values: InMemoryMeterValues,
    firmware_updates: InMemoryRecords<FirmwareUpdate>,
    diagnostics: InMemoryRecords<Diagnostics>,
    local_auth_lists: InMemoryRecords<LocalAuthList>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn charge_points(&self) -> &dyn ChargePointRepository {
        &self.charge_points
    }
    fn connectors(&self) -> &dyn ConnectorRepository {
        &self.connectors
    }
    fn transactions(&self) -> &dyn TransactionRepository {
        &self.transactions
    }
    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }
    fn charging_profiles(&self) -> &dyn ChargingProfileRepository {
        &self.charging_profiles
    }
    fn configuration(&self) -> &dyn ConfigurationRepository {
        &self.configuration
    }
    fn id_tags(&self) -> &dyn IdTagRepository {
        &self.id_tags
    }
    fn meter_values(&self) -> &dyn MeterValueRepository {
        &self.meter_values
    }
    fn firmware_updates(&self) -> &dyn FirmwareUpdateRepository {
        &self.firmware_updates
    }
    fn diagnostics(&self) -> &dyn DiagnosticsRepository {
        &self.diagnostics
    }
    fn local_auth_lists(&self) -> &dyn LocalAuthListRepository {
        &self.local_auth_lists
    }
}

// ── Charge points & connectors ─────────────────────────────────

#[derive(Default)]
struct InMemoryChargePoints {
    items: DashMap<String, ChargePoint>,
}

#[async_trait]
impl ChargePointRepository for InMemoryChargePoints {
    async fn save(&self, charge_point: ChargePoint) -> DomainResult<()> {
        self.items.insert(charge_point.id.clone(), charge_point);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        Ok(self.items.get(id).map(|cp| cp.clone()))
    }

    async fn update(&self, charge_point: ChargePoint) -> DomainResult<()> {
        match self.items.get_mut(&charge_point.id) {
            Some(mut slot) => {
                *slot = charge_point;
                Ok(())
            }
            None => Err(DomainError::not_found("ChargePoint", "id", &charge_point.id)),
        }
    }

    async fn touch(&self, id: &str) -> DomainResult<()> {
        if let Some(mut cp) = self.items.get_mut(id) {
            cp.touch();
        }
        Ok(())
    }

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>> {
        let mut all: Vec<_> = self.items.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.items
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("ChargePoint", "id", id))
    }
}

#[derive(Default)]
struct InMemoryConnectors {
    items: DashMap<(String, u32), Connector>,
}

#[async_trait]
impl ConnectorRepository for InMemoryConnectors {
    async fn find(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Option<Connector>> {
        Ok(self
            .items
            .get(&(charge_point_id.to_string(), connector_id))
            .map(|c| c.clone()))
    }

    async fn save(&self, connector: Connector) -> DomainResult<()> {
        self.items.insert(
            (connector.charge_point_id.clone(), connector.connector_id),
            connector,
        );
        Ok(())
    }

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Connector>> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|e| e.key().0 == charge_point_id)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|c| c.connector_id);
        Ok(found)
    }
}

// ── Transactions ───────────────────────────────────────────────

#[derive(Default)]
struct InMemoryTransactions {
    items: DashMap<i32, Transaction>,
}

#[async_trait]
impl TransactionRepository for InMemoryTransactions {
    async fn save(&self, transaction: Transaction) -> DomainResult<()> {
        use dashmap::mapref::entry::Entry;
        match self.items.entry(transaction.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "Transaction {} already exists",
                transaction.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(transaction);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transaction>> {
        Ok(self.items.get(&id).map(|t| t.clone()))
    }

    async fn update(&self, transaction: Transaction) -> DomainResult<()> {
        match self.items.get_mut(&transaction.id) {
            Some(mut slot) => {
                *slot = transaction;
                Ok(())
            }
            None => Err(DomainError::not_found("Transaction", "id", transaction.id)),
        }
    }

    async fn find_active_for_connector(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Option<Transaction>> {
        Ok(self
            .items
            .iter()
            .find(|t| {
                t.charge_point_id == charge_point_id
                    && t.connector_id == connector_id
                    && t.is_active()
            })
            .map(|t| t.clone()))
    }

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Transaction>> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|t| t.charge_point_id == charge_point_id)
            .map(|t| t.clone())
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }

    async fn max_id(&self) -> DomainResult<i32> {
        Ok(self.items.iter().map(|t| *t.key()).max().unwrap_or(0))
    }
}

// ── Reservations ───────────────────────────────────────────────

#[derive(Default)]
struct InMemoryReservations {
    items: DashMap<i32, Reservation>,
}

#[async_trait]
impl ReservationRepository for InMemoryReservations {
    async fn save(&self, reservation: Reservation) -> DomainResult<()> {
        self.items.insert(reservation.id, reservation);
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.items.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, reservation: Reservation) -> DomainResult<()> {
        match self.items.get_mut(&reservation.id) {
            Some(mut slot) => {
                *slot = reservation;
                Ok(())
            }
            None => Err(DomainError::not_found("Reservation", "id", reservation.id)),
        }
    }

    async fn transition_from_accepted(&self, id: i32, to: ReservationStatus) -> DomainResult<bool> {
        match self.items.get_mut(&id) {
            Some(mut slot) => Ok(slot.transition(to)),
            None => Err(DomainError::not_found("Reservation", "id", id)),
        }
    }

    async fn find_for_connector(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .items
            .iter()
            .filter(|r| r.charge_point_id == charge_point_id && r.connector_id == connector_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        Ok(self.items.iter().map(|r| r.clone()).collect())
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .items
            .iter()
            .filter(|r| r.is_overdue_at(now))
            .map(|r| r.clone())
            .collect())
    }

    async fn max_id(&self) -> DomainResult<i32> {
        Ok(self.items.iter().map(|r| *r.key()).max().unwrap_or(0))
    }
}

// ── Charging profiles ──────────────────────────────────────────

#[derive(Default)]
struct InMemoryChargingProfiles {
    items: DashMap<(String, i32), ChargingProfile>,
}

#[async_trait]
impl ChargingProfileRepository for InMemoryChargingProfiles {
    async fn save(&self, profile: ChargingProfile) -> DomainResult<()> {
        self.items
            .insert((profile.charge_point_id.clone(), profile.profile_id), profile);
        Ok(())
    }

    async fn find(
        &self,
        charge_point_id: &str,
        filter: &ProfileFilter,
    ) -> DomainResult<Vec<ChargingProfile>> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|e| e.key().0 == charge_point_id && filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|p| (p.stack_level, p.profile_id));
        Ok(found)
    }

    async fn delete(&self, charge_point_id: &str, filter: &ProfileFilter) -> DomainResult<usize> {
        let mut removed = 0;
        self.items.retain(|(cp, _), profile| {
            let hit = cp == charge_point_id && filter.matches(profile);
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }
}

// ── Configuration ──────────────────────────────────────────────

#[derive(Default)]
struct InMemoryConfiguration {
    items: DashMap<String, Vec<ConfigurationEntry>>,
}

#[async_trait]
impl ConfigurationRepository for InMemoryConfiguration {
    async fn find_for_charge_point(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Vec<ConfigurationEntry>> {
        Ok(self
            .items
            .get(charge_point_id)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn find(
        &self,
        charge_point_id: &str,
        key: &str,
    ) -> DomainResult<Option<ConfigurationEntry>> {
        Ok(self
            .items
            .get(charge_point_id)
            .and_then(|entries| entries.iter().find(|e| e.key == key).cloned()))
    }

    async fn save(&self, entry: ConfigurationEntry) -> DomainResult<()> {
        let mut entries = self.items.entry(entry.charge_point_id.clone()).or_default();
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn seed_if_empty(
        &self,
        charge_point_id: &str,
        seed: Vec<ConfigurationEntry>,
    ) -> DomainResult<bool> {
        let mut entries = self.items.entry(charge_point_id.to_string()).or_default();
        if !entries.is_empty() {
            return Ok(false);
        }
        *entries = seed;
        Ok(true)
    }
}

// ── Id tags ────────────────────────────────────────────────────

#[derive(Default)]
struct InMemoryIdTags {
    items: DashMap<String, IdTag>,
}

#[async_trait]
impl IdTagRepository for InMemoryIdTags {
    async fn find_by_id_tag(&self, id_tag: &str) -> DomainResult<Option<IdTag>> {
        Ok(self.items.get(id_tag).map(|t| t.clone()))
    }

    async fn save(&self, id_tag: IdTag) -> DomainResult<()> {
        self.items.insert(id_tag.id_tag.clone(), id_tag);
        Ok(())
    }

    async fn find_all(&self) -> DomainResult<Vec<IdTag>> {
        Ok(self.items.iter().map(|t| t.clone()).collect())
    }
}

// ── Meter values ───────────────────────────────────────────────

#[derive(Default)]
struct InMemoryMeterValues {
    items: DashMap<i64, MeterReading>,
    counter: AtomicI64,
}

#[async_trait]
impl MeterValueRepository for InMemoryMeterValues {
    async fn append(&self, readings: Vec<MeterReading>) -> DomainResult<usize> {
        let count = readings.len();
        for mut reading in readings {
            reading.id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.items.insert(reading.id, reading);
        }
        Ok(count)
    }

    async fn find_for_transaction(&self, transaction_id: i32) -> DomainResult<Vec<MeterReading>> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|r| r.transaction_id == Some(transaction_id))
            .map(|r| r.clone())
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }

    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<MeterReading>> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|r| r.charge_point_id == charge_point_id)
            .map(|r| r.clone())
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }
}

// ── Station-scoped records (firmware, diagnostics, local lists) ─

/// Record kinds that are appended per station and looked up by "latest".
trait StationRecord: Clone + Send + Sync + 'static {
    const ENTITY: &'static str;
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn charge_point_id(&self) -> &str;
}

macro_rules! station_record {
    ($ty:ty, $entity:literal) => {
        impl StationRecord for $ty {
            const ENTITY: &'static str = $entity;
            fn id(&self) -> i64 {
                self.id
            }
            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
            fn charge_point_id(&self) -> &str {
                &self.charge_point_id
            }
        }
    };
}

station_record!(FirmwareUpdate, "FirmwareUpdate");
station_record!(Diagnostics, "Diagnostics");
station_record!(LocalAuthList, "LocalAuthList");

struct InMemoryRecords<T> {
    items: DashMap<i64, T>,
    counter: AtomicI64,
}

impl<T> Default for InMemoryRecords<T> {
    fn default() -> Self {
        Self {
            items: DashMap::new(),
            counter: AtomicI64::new(0),
        }
    }
}

impl<T: StationRecord> InMemoryRecords<T> {
    fn insert_record(&self, mut record: T) -> T {
        record.set_id(self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.items.insert(record.id(), record.clone());
        record
    }

    fn replace_record(&self, record: T) -> DomainResult<()> {
        match self.items.get_mut(&record.id()) {
            Some(mut slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(DomainError::not_found(T::ENTITY, "id", record.id())),
        }
    }

    /// Ids are allocated monotonically, so the highest id is the newest record.
    fn latest(&self, charge_point_id: &str) -> Option<T> {
        self.items
            .iter()
            .filter(|r| r.charge_point_id() == charge_point_id)
            .max_by_key(|r| r.id())
            .map(|r| r.value().clone())
    }

    fn for_charge_point(&self, charge_point_id: &str) -> Vec<T> {
        let mut found: Vec<_> = self
            .items
            .iter()
            .filter(|r| r.charge_point_id() == charge_point_id)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| std::cmp::Reverse(r.id()));
        found
    }
}

#[async_trait]
impl FirmwareUpdateRepository for InMemoryRecords<FirmwareUpdate> {
    async fn create(&self, update: FirmwareUpdate) -> DomainResult<FirmwareUpdate> {
        Ok(self.insert_record(update))
    }
    async fn update(&self, update: FirmwareUpdate) -> DomainResult<()> {
        self.replace_record(update)
    }
    async fn latest_for_charge_point(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Option<FirmwareUpdate>> {
        Ok(self.latest(charge_point_id))
    }
    async fn find_for_charge_point(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Vec<FirmwareUpdate>> {
        Ok(self.for_charge_point(charge_point_id))
    }
}

#[async_trait]
impl DiagnosticsRepository for InMemoryRecords<Diagnostics> {
    async fn create(&self, diagnostics: Diagnostics) -> DomainResult<Diagnostics> {
        Ok(self.insert_record(diagnostics))
    }
    async fn update(&self, diagnostics: Diagnostics) -> DomainResult<()> {
        self.replace_record(diagnostics)
    }
    async fn latest_for_charge_point(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Option<Diagnostics>> {
        Ok(self.latest(charge_point_id))
    }
    async fn find_for_charge_point(&self, charge_point_id: &str) -> DomainResult<Vec<Diagnostics>> {
        Ok(self.for_charge_point(charge_point_id))
    }
}

#[async_trait]
impl LocalAuthListRepository for InMemoryRecords<LocalAuthList> {
    async fn create(&self, list: LocalAuthList) -> DomainResult<LocalAuthList> {
        Ok(self.insert_record(list))
    }
    async fn update(&self, list: LocalAuthList) -> DomainResult<()> {
        self.replace_record(list)
    }
    async fn latest_for_charge_point(
        &self,
        charge_point_id: &str,
    ) -> DomainResult<Option<LocalAuthList>> {
        Ok(self.latest(charge_point_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charging_profile::ChargingProfilePurpose;
    use crate::domain::configuration::default_entries;
    use crate::domain::firmware::UpdateType;

    #[tokio::test]
    async fn duplicate_transaction_id_is_a_conflict() {
        let repos = InMemoryRepositoryProvider::new();
        let tx = Transaction::new(1, "CP1", 1, "TAG", 0, Utc::now());
        repos.transactions().save(tx.clone()).await.unwrap();
        assert!(matches!(
            repos.transactions().save(tx).await,
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(repos.transactions().max_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn configuration_seeds_only_once() {
        let repos = InMemoryRepositoryProvider::new();
        let cfg = repos.configuration();
        assert!(cfg.seed_if_empty("CP1", default_entries("CP1")).await.unwrap());
        assert!(!cfg.seed_if_empty("CP1", default_entries("CP1")).await.unwrap());
        let all = cfg.find_for_charge_point("CP1").await.unwrap();
        assert_eq!(all.len(), default_entries("CP1").len());
    }

    #[tokio::test]
    async fn latest_record_is_highest_id() {
        let repos = InMemoryRepositoryProvider::new();
        let lists = repos.local_auth_lists();
        lists.create(LocalAuthList::new("CP1", 1, UpdateType::Full)).await.unwrap();
        lists.create(LocalAuthList::new("CP2", 9, UpdateType::Full)).await.unwrap();
        let second = lists
            .create(LocalAuthList::new("CP1", 2, UpdateType::Differential))
            .await
            .unwrap();
        let latest = lists.latest_for_charge_point("CP1").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.list_version, 2);
    }

    #[tokio::test]
    async fn profile_delete_removes_only_matches() {
        let repos = InMemoryRepositoryProvider::new();
        let store = repos.charging_profiles();
        for (id, purpose) in [
            (1, ChargingProfilePurpose::TxDefaultProfile),
            (2, ChargingProfilePurpose::TxProfile),
            (3, ChargingProfilePurpose::TxDefaultProfile),
        ] {
            let profile: ChargingProfile = serde_json::from_value(serde_json::json!({
                "chargingProfileId": id,
                "stackLevel": 0,
                "chargingProfilePurpose": purpose,
                "chargingProfileKind": "Absolute",
                "chargingSchedule": {"chargingRateUnit": "W", "chargingSchedulePeriod": []}
            }))
            .unwrap();
            store.save(profile.owned_by("CP1", 1)).await.unwrap();
        }
        let filter = ProfileFilter {
            purpose: Some(ChargingProfilePurpose::TxDefaultProfile),
            ..Default::default()
        };
        assert_eq!(store.delete("CP1", &filter).await.unwrap(), 2);
        let left = store.find("CP1", &ProfileFilter::default()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].profile_id, 2);
    }
}
