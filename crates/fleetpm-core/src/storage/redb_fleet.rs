//! redb-backed fleet store.
//!
//! Every record is a postcard value behind the record header from
//! [`formats`](crate::formats). Ids come from per-kind sequences stored in the
//! same database, so an aborted transaction never consumes an id.
//!
//! Composite mutations (maintenance, job start/close, supply deletion,
//! restore) re-read what they validate inside their write transaction and
//! commit only after every check passes. A failed check drops the
//! transaction, which aborts it.

use crate::access::{Role, User};
use crate::cycle::PmType;
use crate::error::{FleetError, Result};
use crate::export::FleetSnapshot;
use crate::formats::{decode_record, encode_record};
use crate::kit::{KitConfig, KitItem, PmKit};
use crate::ledger::{JobClose, OpenJob, UsageRecord, begin_job, close_job};
use crate::machine::{Machine, MachineDraft, MachineEdit};
use crate::maintenance::{MaintenanceKind, MaintenanceRecord, MaintenanceRequest, plan_maintenance};
use crate::primitives::BLOCK_THRESHOLD_HOURS;
use crate::supply::{Supply, SupplyDraft, SupplyEdit};
use crate::system::{FleetOverview, Notification, assess_fleet, collect_notifications};
use crate::types::{FuelLevel, MachineId, RecordId, SupplyId, TimestampMs, UserId};
use redb::{
    Database, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// TABLES
// =============================================================================

type RecordTableDef = TableDefinition<'static, u64, &'static [u8]>;
type RecordTable<'txn> = Table<'txn, u64, &'static [u8]>;

const MACHINES: RecordTableDef = TableDefinition::new("machines");
const SUPPLIES: RecordTableDef = TableDefinition::new("supplies");
const MAINTENANCE: RecordTableDef = TableDefinition::new("maintenance");
const USAGE: RecordTableDef = TableDefinition::new("usage");
const USERS: RecordTableDef = TableDefinition::new("users");
/// Keyed by machine id: at most one open job per machine.
const OPEN_JOBS: RecordTableDef = TableDefinition::new("open_jobs");
/// Keyed by [`PmType::code`].
const KITS: TableDefinition<u8, &[u8]> = TableDefinition::new("kits");
/// Last id handed out, per record kind.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const SEQ_MACHINE: &str = "machine";
const SEQ_SUPPLY: &str = "supply";
const SEQ_MAINTENANCE: &str = "maintenance";
const SEQ_USAGE: &str = "usage";
const SEQ_USER: &str = "user";

// =============================================================================
// HELPERS
// =============================================================================

fn read_record<T, R>(table: &R, id: u64) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(guard) => Ok(Some(decode_record(guard.value())?)),
        None => Ok(None),
    }
}

fn read_all<T, R>(table: &R) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(decode_record(value.value())?);
    }
    Ok(records)
}

fn write_record<T: Serialize>(table: &mut RecordTable<'_>, id: u64, value: &T) -> Result<()> {
    let bytes = encode_record(value)?;
    table.insert(id, bytes.as_slice())?;
    Ok(())
}

fn read_kits<R>(table: &R) -> Result<KitConfig>
where
    R: ReadableTable<u8, &'static [u8]>,
{
    let mut config = KitConfig::new();
    for entry in table.iter()? {
        let (key, value) = entry?;
        let code = key.value();
        let pm_type = PmType::from_code(code)
            .ok_or_else(|| FleetError::Format(format!("unknown PM code {code} in kit table")))?;
        config.set(pm_type, decode_record(value.value())?);
    }
    Ok(config)
}

fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let last = table.get(sequence)?.map(|guard| guard.value()).unwrap_or(0);
    let next = last.saturating_add(1);
    table.insert(sequence, next)?;
    Ok(next)
}

fn last_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0)
}

fn newest_first_maintenance(records: &mut [MaintenanceRecord]) {
    records.sort_by_key(|r| Reverse((r.recorded_at_ms, r.id)));
}

fn newest_first_usage(records: &mut [UsageRecord]) {
    records.sort_by_key(|r| Reverse((r.end_time_ms, r.id)));
}

// =============================================================================
// STORE
// =============================================================================

/// The fleet record store.
pub struct RedbFleet {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbFleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbFleet").field("path", &self.path).finish()
    }
}

impl RedbFleet {
    /// Create a store at `path`, or open it if it already exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)?;
        let store = Self { db, path };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Open an existing store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::open(&path)?;
        let store = Self { db, path };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_tables(&self) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            txn.open_table(MACHINES)?;
            txn.open_table(SUPPLIES)?;
            txn.open_table(MAINTENANCE)?;
            txn.open_table(USAGE)?;
            txn.open_table(USERS)?;
            txn.open_table(OPEN_JOBS)?;
            txn.open_table(KITS)?;
            txn.open_table(SEQUENCES)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn list<T: DeserializeOwned>(&self, def: RecordTableDef) -> Result<Vec<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        read_all(&table)
    }

    fn get<T: DeserializeOwned>(
        &self,
        def: RecordTableDef,
        kind: &'static str,
        id: u64,
        label: impl ToString,
    ) -> Result<T> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        read_record(&table, id)?.ok_or_else(|| FleetError::not_found(kind, label))
    }

    // =========================================================================
    // MACHINES
    // =========================================================================

    /// Register a machine. `now_ms` seeds its series number.
    pub fn register_machine(&self, draft: MachineDraft, now_ms: TimestampMs) -> Result<Machine> {
        let txn = self.db.begin_write()?;
        let machine = {
            let id = MachineId(next_id(&txn, SEQ_MACHINE)?);
            let machine = Machine::register(id, draft, now_ms);
            let mut table = txn.open_table(MACHINES)?;
            write_record(&mut table, id.0, &machine)?;
            machine
        };
        txn.commit()?;
        Ok(machine)
    }

    fn update_machine<F>(&self, id: MachineId, apply: F) -> Result<Machine>
    where
        F: FnOnce(&mut Machine) -> Result<()>,
    {
        let txn = self.db.begin_write()?;
        let machine = {
            let mut table = txn.open_table(MACHINES)?;
            let mut machine: Machine =
                read_record(&table, id.0)?.ok_or_else(|| FleetError::not_found("machine", id))?;
            apply(&mut machine)?;
            write_record(&mut table, id.0, &machine)?;
            machine
        };
        txn.commit()?;
        Ok(machine)
    }

    /// Apply an administrative edit.
    pub fn edit_machine(&self, id: MachineId, edit: MachineEdit) -> Result<Machine> {
        self.update_machine(id, |machine| {
            machine.apply_edit(edit);
            Ok(())
        })
    }

    /// Raise a machine's fuel level.
    pub fn refuel(&self, id: MachineId, percent: u64) -> Result<Machine> {
        let level = FuelLevel::new(percent)?;
        self.update_machine(id, |machine| machine.refuel(level))
    }

    /// Delete a machine. Its history is kept.
    pub fn delete_machine(&self, id: MachineId) -> Result<Machine> {
        let txn = self.db.begin_write()?;
        let machine = {
            let mut table = txn.open_table(MACHINES)?;
            let machine: Machine =
                read_record(&table, id.0)?.ok_or_else(|| FleetError::not_found("machine", id))?;
            if machine.is_in_use {
                return Err(FleetError::MachineInUse(id));
            }
            table.remove(id.0)?;
            machine
        };
        txn.commit()?;
        Ok(machine)
    }

    pub fn machine(&self, id: MachineId) -> Result<Machine> {
        self.get(MACHINES, "machine", id.0, id)
    }

    /// All machines in id order.
    pub fn machines(&self) -> Result<Vec<Machine>> {
        self.list(MACHINES)
    }

    // =========================================================================
    // SUPPLIES
    // =========================================================================

    pub fn add_supply(&self, draft: SupplyDraft) -> Result<Supply> {
        let txn = self.db.begin_write()?;
        let supply = {
            let id = SupplyId(next_id(&txn, SEQ_SUPPLY)?);
            let supply = Supply::new(id, draft);
            let mut table = txn.open_table(SUPPLIES)?;
            write_record(&mut table, id.0, &supply)?;
            supply
        };
        txn.commit()?;
        Ok(supply)
    }

    fn update_supply<F>(&self, id: SupplyId, apply: F) -> Result<Supply>
    where
        F: FnOnce(&mut Supply) -> Result<()>,
    {
        let txn = self.db.begin_write()?;
        let supply = {
            let mut table = txn.open_table(SUPPLIES)?;
            let mut supply: Supply =
                read_record(&table, id.0)?.ok_or(FleetError::UnknownSupply(id))?;
            apply(&mut supply)?;
            write_record(&mut table, id.0, &supply)?;
            supply
        };
        txn.commit()?;
        Ok(supply)
    }

    pub fn edit_supply(&self, id: SupplyId, edit: SupplyEdit) -> Result<Supply> {
        self.update_supply(id, |supply| {
            supply.apply_edit(edit);
            Ok(())
        })
    }

    /// Add a strictly positive quantity to a supply.
    pub fn restock(&self, id: SupplyId, quantity: u64) -> Result<Supply> {
        self.update_supply(id, |supply| supply.restock(quantity).map(|_| ()))
    }

    /// Delete a supply and drop it from every kit.
    pub fn delete_supply(&self, id: SupplyId) -> Result<Supply> {
        let txn = self.db.begin_write()?;
        let supply = {
            let mut supplies = txn.open_table(SUPPLIES)?;
            let supply: Supply =
                read_record(&supplies, id.0)?.ok_or(FleetError::UnknownSupply(id))?;
            supplies.remove(id.0)?;

            let mut kits = txn.open_table(KITS)?;
            let config = read_kits(&kits)?;
            for (pm_type, kit) in config.iter() {
                let mut kit = kit.clone();
                if kit.remove(id).is_some() {
                    let bytes = encode_record(&kit)?;
                    kits.insert(pm_type.code(), bytes.as_slice())?;
                }
            }
            supply
        };
        txn.commit()?;
        Ok(supply)
    }

    pub fn supply(&self, id: SupplyId) -> Result<Supply> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SUPPLIES)?;
        read_record(&table, id.0)?.ok_or(FleetError::UnknownSupply(id))
    }

    /// All supplies in id order.
    pub fn supplies(&self) -> Result<Vec<Supply>> {
        self.list(SUPPLIES)
    }

    // =========================================================================
    // KITS
    // =========================================================================

    /// Every configured kit.
    pub fn kit_config(&self) -> Result<KitConfig> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KITS)?;
        read_kits(&table)
    }

    /// Add or replace the kit item for `supply_id`. Returns the updated kit.
    pub fn upsert_kit_item(
        &self,
        pm_type: PmType,
        supply_id: SupplyId,
        quantity: u64,
        is_mandatory: bool,
    ) -> Result<PmKit> {
        let txn = self.db.begin_write()?;
        let kit = {
            let supplies = txn.open_table(SUPPLIES)?;
            let supply: Supply =
                read_record(&supplies, supply_id.0)?.ok_or(FleetError::UnknownSupply(supply_id))?;

            let mut kits = txn.open_table(KITS)?;
            let mut kit: PmKit = match kits.get(pm_type.code())? {
                Some(guard) => decode_record(guard.value())?,
                None => PmKit::new(),
            };
            kit.upsert(KitItem {
                supply_id,
                name: supply.name,
                quantity,
                is_mandatory,
            })?;
            let bytes = encode_record(&kit)?;
            kits.insert(pm_type.code(), bytes.as_slice())?;
            kit
        };
        txn.commit()?;
        Ok(kit)
    }

    /// Remove the kit item for `supply_id`. Returns the removed item.
    pub fn remove_kit_item(&self, pm_type: PmType, supply_id: SupplyId) -> Result<KitItem> {
        let txn = self.db.begin_write()?;
        let item = {
            let mut kits = txn.open_table(KITS)?;
            let mut kit: PmKit = match kits.get(pm_type.code())? {
                Some(guard) => decode_record(guard.value())?,
                None => PmKit::new(),
            };
            let item = kit
                .remove(supply_id)
                .ok_or_else(|| FleetError::not_found("kit item", format!("{pm_type}/{supply_id}")))?;
            let bytes = encode_record(&kit)?;
            kits.insert(pm_type.code(), bytes.as_slice())?;
            item
        };
        txn.commit()?;
        Ok(item)
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Validate and apply a maintenance event atomically.
    ///
    /// The machine update, the history record and every stock decrement are
    /// written in one transaction; any rejection leaves the store unchanged.
    pub fn register_maintenance(
        &self,
        request: &MaintenanceRequest,
        now_ms: TimestampMs,
    ) -> Result<MaintenanceRecord> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut machines = txn.open_table(MACHINES)?;
            let mut supplies = txn.open_table(SUPPLIES)?;
            let kits_table = txn.open_table(KITS)?;

            let machine: Machine = read_record(&machines, request.machine_id.0)?
                .ok_or_else(|| FleetError::not_found("machine", request.machine_id))?;
            let kits = read_kits(&kits_table)?;
            let mut on_hand = BTreeMap::new();
            for line in &request.supplies_used {
                if let Some(supply) = read_record::<Supply, _>(&supplies, line.supply_id.0)? {
                    on_hand.insert(supply.id, supply);
                }
            }

            let record_id = RecordId(next_id(&txn, SEQ_MAINTENANCE)?);
            let plan = plan_maintenance(&machine, request, &kits, &on_hand, record_id, now_ms)?;

            write_record(&mut machines, plan.machine.id.0, &plan.machine)?;
            for update in &plan.stock_updates {
                if let Some(supply) = on_hand.get_mut(&update.supply_id) {
                    supply.stock = update.new_stock;
                    write_record(&mut supplies, supply.id.0, supply)?;
                }
            }
            let mut history = txn.open_table(MAINTENANCE)?;
            write_record(&mut history, plan.record.id.0, &plan.record)?;
            plan.record
        };
        txn.commit()?;
        Ok(record)
    }

    /// Maintenance history, newest first, optionally filtered.
    pub fn maintenance_history(
        &self,
        machine: Option<MachineId>,
        kind: Option<MaintenanceKind>,
    ) -> Result<Vec<MaintenanceRecord>> {
        let mut records: Vec<MaintenanceRecord> = self.list(MAINTENANCE)?;
        records.retain(|r| {
            machine.is_none_or(|id| r.machine_id == id) && kind.is_none_or(|k| r.kind == k)
        });
        newest_first_maintenance(&mut records);
        Ok(records)
    }

    // =========================================================================
    // OPERATION JOBS
    // =========================================================================

    /// Open a job for `operator` on a machine.
    pub fn start_job(
        &self,
        machine_id: MachineId,
        operator: &str,
        now_ms: TimestampMs,
    ) -> Result<OpenJob> {
        let txn = self.db.begin_write()?;
        let job = {
            let mut machines = txn.open_table(MACHINES)?;
            let mut jobs = txn.open_table(OPEN_JOBS)?;

            let mut machine: Machine = read_record(&machines, machine_id.0)?
                .ok_or_else(|| FleetError::not_found("machine", machine_id))?;
            let open: Vec<OpenJob> = read_all(&jobs)?;
            let operator_busy = open.iter().any(|job| job.operator == operator);

            let job = begin_job(&mut machine, operator, now_ms, operator_busy, BLOCK_THRESHOLD_HOURS)?;
            write_record(&mut machines, machine_id.0, &machine)?;
            write_record(&mut jobs, machine_id.0, &job)?;
            job
        };
        txn.commit()?;
        Ok(job)
    }

    /// Close the open job of `operator`.
    pub fn end_job(
        &self,
        operator: &str,
        close: &JobClose,
        now_ms: TimestampMs,
    ) -> Result<UsageRecord> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut machines = txn.open_table(MACHINES)?;
            let mut jobs = txn.open_table(OPEN_JOBS)?;

            let open: Vec<OpenJob> = read_all(&jobs)?;
            let job = open
                .into_iter()
                .find(|job| job.operator == operator)
                .ok_or_else(|| FleetError::NoOpenJob(operator.to_string()))?;
            let mut machine: Machine = read_record(&machines, job.machine_id.0)?
                .ok_or_else(|| FleetError::not_found("machine", job.machine_id))?;

            let record_id = RecordId(next_id(&txn, SEQ_USAGE)?);
            let record = close_job(&mut machine, &job, close, record_id, now_ms)?;

            write_record(&mut machines, machine.id.0, &machine)?;
            jobs.remove(job.machine_id.0)?;
            let mut usage = txn.open_table(USAGE)?;
            write_record(&mut usage, record.id.0, &record)?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    /// All open jobs, by machine id.
    pub fn open_jobs(&self) -> Result<Vec<OpenJob>> {
        self.list(OPEN_JOBS)
    }

    /// The open job of `operator`, if any.
    pub fn open_job_for(&self, operator: &str) -> Result<Option<OpenJob>> {
        Ok(self
            .open_jobs()?
            .into_iter()
            .find(|job| job.operator == operator))
    }

    /// Closed jobs, newest first, optionally for one machine.
    pub fn usage_history(&self, machine: Option<MachineId>) -> Result<Vec<UsageRecord>> {
        let mut records: Vec<UsageRecord> = self.list(USAGE)?;
        records.retain(|r| machine.is_none_or(|id| r.machine_id == id));
        newest_first_usage(&mut records);
        Ok(records)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Add a user. Usernames are unique.
    pub fn add_user(&self, username: &str, role: Role, now_ms: TimestampMs) -> Result<User> {
        let username = username.trim();
        let txn = self.db.begin_write()?;
        let user = {
            let mut table = txn.open_table(USERS)?;
            let existing: Vec<User> = read_all(&table)?;
            if existing.iter().any(|u| u.username == username) {
                return Err(FleetError::DuplicateUsername(username.to_string()));
            }
            let user = User {
                id: UserId(next_id(&txn, SEQ_USER)?),
                username: username.to_string(),
                role,
                created_at_ms: now_ms,
            };
            write_record(&mut table, user.id.0, &user)?;
            user
        };
        txn.commit()?;
        Ok(user)
    }

    fn update_user<F>(&self, username: &str, apply: F) -> Result<User>
    where
        F: FnOnce(&mut RecordTable<'_>, User) -> Result<User>,
    {
        let txn = self.db.begin_write()?;
        let user = {
            let mut table = txn.open_table(USERS)?;
            let users: Vec<User> = read_all(&table)?;
            let user = users
                .into_iter()
                .find(|u| u.username == username)
                .ok_or_else(|| FleetError::not_found("user", username))?;
            apply(&mut table, user)?
        };
        txn.commit()?;
        Ok(user)
    }

    /// Change a user's role.
    pub fn set_role(&self, username: &str, role: Role) -> Result<User> {
        self.update_user(username, |table, mut user| {
            user.role = role;
            write_record(table, user.id.0, &user)?;
            Ok(user)
        })
    }

    /// Remove a user. Returns the removed account.
    pub fn remove_user(&self, username: &str) -> Result<User> {
        self.update_user(username, |table, user| {
            table.remove(user.id.0)?;
            Ok(user)
        })
    }

    /// All users in id order.
    pub fn users(&self) -> Result<Vec<User>> {
        self.list(USERS)
    }

    pub fn user_by_name(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.username == username))
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Dashboard figures.
    pub fn overview(&self) -> Result<FleetOverview> {
        let snapshot = self.snapshot()?;
        Ok(assess_fleet(
            &snapshot.machines,
            &snapshot.supplies,
            &snapshot.maintenance,
            &snapshot.usage,
        ))
    }

    /// Current notifications.
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        let txn = self.db.begin_read()?;
        let machines: Vec<Machine> = read_all(&txn.open_table(MACHINES)?)?;
        let supplies: Vec<Supply> = read_all(&txn.open_table(SUPPLIES)?)?;
        Ok(collect_notifications(&machines, &supplies))
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    /// Read every record in one consistent view.
    pub fn snapshot(&self) -> Result<FleetSnapshot> {
        let txn = self.db.begin_read()?;
        let kits = read_kits(&txn.open_table(KITS)?)?;
        Ok(FleetSnapshot {
            machines: read_all(&txn.open_table(MACHINES)?)?,
            supplies: read_all(&txn.open_table(SUPPLIES)?)?,
            kits: kits.iter().map(|(pm, kit)| (pm, kit.clone())).collect(),
            users: read_all(&txn.open_table(USERS)?)?,
            maintenance: read_all(&txn.open_table(MAINTENANCE)?)?,
            usage: read_all(&txn.open_table(USAGE)?)?,
            open_jobs: read_all(&txn.open_table(OPEN_JOBS)?)?,
        })
    }

    /// Replace the whole store with `snapshot`.
    ///
    /// The snapshot is validated first; an inconsistent one is rejected with
    /// [`FleetError::Format`] and the store is left as it was. Sequences
    /// restart after the highest restored id of each kind.
    pub fn restore(&self, snapshot: &FleetSnapshot) -> Result<()> {
        snapshot.validate()?;
        let txn = self.db.begin_write()?;
        txn.delete_table(MACHINES)?;
        txn.delete_table(SUPPLIES)?;
        txn.delete_table(MAINTENANCE)?;
        txn.delete_table(USAGE)?;
        txn.delete_table(USERS)?;
        txn.delete_table(OPEN_JOBS)?;
        txn.delete_table(KITS)?;
        txn.delete_table(SEQUENCES)?;
        {
            let mut table = txn.open_table(MACHINES)?;
            for machine in &snapshot.machines {
                write_record(&mut table, machine.id.0, machine)?;
            }
            let mut table = txn.open_table(SUPPLIES)?;
            for supply in &snapshot.supplies {
                write_record(&mut table, supply.id.0, supply)?;
            }
            let mut table = txn.open_table(MAINTENANCE)?;
            for record in &snapshot.maintenance {
                write_record(&mut table, record.id.0, record)?;
            }
            let mut table = txn.open_table(USAGE)?;
            for record in &snapshot.usage {
                write_record(&mut table, record.id.0, record)?;
            }
            let mut table = txn.open_table(USERS)?;
            for user in &snapshot.users {
                write_record(&mut table, user.id.0, user)?;
            }
            let mut table = txn.open_table(OPEN_JOBS)?;
            for job in &snapshot.open_jobs {
                write_record(&mut table, job.machine_id.0, job)?;
            }
            let mut kits = txn.open_table(KITS)?;
            for (pm_type, kit) in &snapshot.kits {
                let bytes = encode_record(kit)?;
                kits.insert(pm_type.code(), bytes.as_slice())?;
            }

            let mut sequences = txn.open_table(SEQUENCES)?;
            sequences.insert(SEQ_MACHINE, last_id(snapshot.machines.iter().map(|m| m.id.0)))?;
            sequences.insert(SEQ_SUPPLY, last_id(snapshot.supplies.iter().map(|s| s.id.0)))?;
            sequences.insert(
                SEQ_MAINTENANCE,
                last_id(snapshot.maintenance.iter().map(|r| r.id.0)),
            )?;
            sequences.insert(SEQ_USAGE, last_id(snapshot.usage.iter().map(|r| r.id.0)))?;
            sequences.insert(SEQ_USER, last_id(snapshot.users.iter().map(|u| u.id.0)))?;
        }
        txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
