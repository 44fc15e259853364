//! # CLI Commands
//!
//! Command definitions (clap) and the `cmd_*` functions behind them.
//!
//! Each `cmd_*` function opens a [`FleetSession`], checks the acting user's
//! role, runs one store operation, prints the result (text or JSON) and
//! returns it.

use crate::config::{DEFAULT_ACTOR, DEFAULT_DB_PATH, Settings};
use crate::error::{CliError, Result};
use crate::session::{FleetSession, now_ms};
use clap::{Args, Parser, Subcommand};
use fleetpm_core::export::{FleetSnapshot, export_canonical, import_canonical};
use fleetpm_core::formats::SNAPSHOT_MAGIC;
use fleetpm_core::maintenance::prefill_supplies;
use fleetpm_core::system::{FleetOverview, Notification};
use fleetpm_core::{
    Action, CycleIndex, FuelLevel, JobClose, KitConfig, KitItem, Machine, MachineDraft,
    MachineEdit, MachineId, MaintenanceKind, MaintenanceRecord, MaintenanceRequest, OpenJob,
    PmKit, PmType, RedbFleet, Role, Supply, SupplyDraft, SupplyEdit, SupplyId, UsageLine,
    UsageRecord, User, recommended_cycle_index,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// =============================================================================
// COMMAND LINE
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "fleetpm",
    version,
    about = "Preventive-maintenance tracking for heavy-equipment fleets"
)]
pub struct Cli {
    /// Database file.
    #[arg(long, global = true, env = "FLEETPM_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Acting user.
    #[arg(
        long = "as",
        global = true,
        env = "FLEETPM_USER",
        default_value = DEFAULT_ACTOR,
        value_name = "USERNAME"
    )]
    pub actor: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new fleet database with an administrator.
    Init {
        /// Overwrite an existing database.
        #[arg(long)]
        force: bool,
        /// Username of the first administrator.
        #[arg(long, default_value = DEFAULT_ACTOR)]
        admin: String,
        /// Load demo machines, supplies, kits and users.
        #[arg(long)]
        seed: bool,
    },
    /// Manage machines.
    #[command(subcommand)]
    Machine(MachineCommand),
    /// Show the recommended cycle step for an hour-meter reading.
    Recommend {
        /// Hour-meter reading.
        hm: u64,
    },
    /// Register and list maintenance events.
    #[command(subcommand)]
    Maintenance(MaintenanceCommand),
    /// Open and close operation jobs.
    #[command(subcommand)]
    Job(JobCommand),
    /// Closed operation jobs.
    #[command(subcommand)]
    Usage(UsageCommand),
    /// Configure PM kits.
    #[command(subcommand)]
    Kit(KitCommand),
    /// Manage the supply inventory.
    #[command(subcommand)]
    Supply(SupplyCommand),
    /// Manage user accounts.
    #[command(subcommand)]
    User(UserCommand),
    /// Show PM and stock notifications.
    Alerts,
    /// Show the fleet overview.
    Status,
    /// Export the whole fleet to a file.
    Export {
        path: PathBuf,
        /// canonical (binary) or json.
        #[arg(long, default_value = "canonical")]
        format: String,
    },
    /// Replace the fleet with the contents of an export file.
    Import { path: PathBuf },
}

#[derive(Debug, Args)]
pub struct MachineFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub plate: Option<String>,
    /// Hour-meter reading.
    #[arg(long)]
    pub hm: Option<u64>,
    /// Cycle index 0-7; inferred from the hour-meter when omitted on add.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
    pub cycle_index: Option<u8>,
    /// Fuel level in percent.
    #[arg(long)]
    pub fuel: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum MachineCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long, default_value = "")]
        plate: String,
        #[arg(long)]
        hm: u64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
        cycle_index: Option<u8>,
        #[arg(long, default_value_t = 100)]
        fuel: u64,
    },
    Edit {
        id: u64,
        #[command(flatten)]
        fields: MachineFields,
    },
    List,
    Show {
        id: u64,
    },
    Delete {
        id: u64,
    },
    Refuel {
        id: u64,
        /// New fuel level in percent.
        level: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum MaintenanceCommand {
    Register {
        #[arg(long)]
        machine: u64,
        /// scheduled or corrective.
        #[arg(long, default_value = "scheduled")]
        kind: String,
        /// Hour-meter reading at completion.
        #[arg(long)]
        hm: u64,
        /// Fuel level in percent after the work.
        #[arg(long)]
        fuel: u64,
        #[arg(long, default_value = "")]
        description: String,
        /// Consumed supply as ID:QTY; repeatable.
        #[arg(long = "supply", value_parser = parse_usage_line)]
        supplies: Vec<UsageLine>,
        /// Start from the kit of the machine's next PM.
        #[arg(long)]
        prefill: bool,
    },
    History {
        #[arg(long)]
        machine: Option<u64>,
        #[arg(long)]
        kind: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    Start {
        #[arg(long)]
        machine: u64,
    },
    End {
        /// Hour-meter reading at close.
        #[arg(long)]
        hm: u64,
        /// Fuel level in percent at close.
        #[arg(long)]
        fuel: u64,
        /// Accept a fuel drop of more than 50 points.
        #[arg(long)]
        confirm: bool,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum UsageCommand {
    History {
        #[arg(long)]
        machine: Option<u64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum KitCommand {
    Show {
        /// PM1-PM4; all kits when omitted.
        pm: Option<String>,
    },
    Add {
        pm: String,
        #[arg(long)]
        supply: u64,
        #[arg(long)]
        qty: u64,
        #[arg(long)]
        mandatory: bool,
    },
    Remove {
        pm: String,
        #[arg(long)]
        supply: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum SupplyCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        unit: String,
        #[arg(long, default_value_t = 0)]
        stock: u64,
    },
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        stock: Option<u64>,
    },
    Restock {
        id: u64,
        qty: u64,
    },
    Delete {
        id: u64,
    },
    List {
        /// Only supplies below the low-stock threshold.
        #[arg(long)]
        low: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    Add {
        username: String,
        #[arg(long)]
        role: String,
    },
    Role {
        username: String,
        role: String,
    },
    Remove {
        username: String,
    },
    List,
}

/// Parse `ID:QTY`.
pub fn parse_usage_line(raw: &str) -> std::result::Result<UsageLine, String> {
    let (id, qty) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ID:QTY, got {raw:?}"))?;
    let supply_id = id
        .trim()
        .trim_start_matches(['S', 's'])
        .parse::<u64>()
        .map_err(|e| format!("bad supply id {id:?}: {e}"))?;
    let quantity = qty
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("bad quantity {qty:?}: {e}"))?;
    Ok(UsageLine {
        supply_id: SupplyId(supply_id),
        quantity,
    })
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings {
        db_path: cli.db,
        actor: cli.actor,
        json: cli.json,
    };
    let s = &settings;

    match cli.command {
        Commands::Init { force, admin, seed } => cmd_init(&s.db_path, force, &admin, seed),
        Commands::Recommend { hm } => cmd_recommend(s, hm).map(drop),
        Commands::Machine(command) => match command {
            MachineCommand::Add {
                name,
                model,
                plate,
                hm,
                cycle_index,
                fuel,
            } => {
                let draft = MachineDraft {
                    name,
                    model,
                    plate,
                    current_hm: hm,
                    cycle_index: cycle_index.map(CycleIndex::from),
                    fuel_level: FuelLevel::new(fuel)?,
                };
                cmd_machine_add(s, draft).map(drop)
            }
            MachineCommand::Edit { id, fields } => {
                let edit = MachineEdit {
                    name: fields.name,
                    model: fields.model,
                    plate: fields.plate,
                    current_hm: fields.hm,
                    cycle_index: fields.cycle_index.map(CycleIndex::from),
                    fuel_level: fields.fuel.map(FuelLevel::new).transpose()?,
                };
                cmd_machine_edit(s, MachineId(id), edit).map(drop)
            }
            MachineCommand::List => cmd_machine_list(s).map(drop),
            MachineCommand::Show { id } => cmd_machine_show(s, MachineId(id)).map(drop),
            MachineCommand::Delete { id } => cmd_machine_delete(s, MachineId(id)).map(drop),
            MachineCommand::Refuel { id, level } => {
                cmd_machine_refuel(s, MachineId(id), level).map(drop)
            }
        },
        Commands::Maintenance(command) => match command {
            MaintenanceCommand::Register {
                machine,
                kind,
                hm,
                fuel,
                description,
                supplies,
                prefill,
            } => {
                let request = MaintenanceRequest {
                    machine_id: MachineId(machine),
                    kind: kind.parse::<MaintenanceKind>()?,
                    hm_done: hm,
                    fuel_level: fuel,
                    description,
                    supplies_used: supplies,
                };
                cmd_maintenance_register(s, request, prefill).map(drop)
            }
            MaintenanceCommand::History { machine, kind } => {
                cmd_maintenance_history(s, machine.map(MachineId), kind.as_deref()).map(drop)
            }
        },
        Commands::Job(command) => match command {
            JobCommand::Start { machine } => cmd_job_start(s, MachineId(machine)).map(drop),
            JobCommand::End { hm, fuel, confirm } => {
                let close = JobClose {
                    end_hm: hm,
                    end_fuel: fuel,
                    confirm_high_consumption: confirm,
                };
                cmd_job_end(s, close).map(drop)
            }
            JobCommand::List => cmd_job_list(s).map(drop),
        },
        Commands::Usage(UsageCommand::History { machine }) => {
            cmd_usage_history(s, machine.map(MachineId)).map(drop)
        }
        Commands::Kit(command) => match command {
            KitCommand::Show { pm } => cmd_kit_show(s, pm.as_deref()).map(drop),
            KitCommand::Add {
                pm,
                supply,
                qty,
                mandatory,
            } => cmd_kit_add(s, &pm, SupplyId(supply), qty, mandatory).map(drop),
            KitCommand::Remove { pm, supply } => {
                cmd_kit_remove(s, &pm, SupplyId(supply)).map(drop)
            }
        },
        Commands::Supply(command) => match command {
            SupplyCommand::Add { name, unit, stock } => {
                cmd_supply_add(s, SupplyDraft { name, unit, stock }).map(drop)
            }
            SupplyCommand::Edit {
                id,
                name,
                unit,
                stock,
            } => cmd_supply_edit(s, SupplyId(id), SupplyEdit { name, unit, stock }).map(drop),
            SupplyCommand::Restock { id, qty } => cmd_supply_restock(s, SupplyId(id), qty).map(drop),
            SupplyCommand::Delete { id } => cmd_supply_delete(s, SupplyId(id)).map(drop),
            SupplyCommand::List { low } => cmd_supply_list(s, low).map(drop),
        },
        Commands::User(command) => match command {
            UserCommand::Add { username, role } => cmd_user_add(s, &username, &role).map(drop),
            UserCommand::Role { username, role } => cmd_user_role(s, &username, &role).map(drop),
            UserCommand::Remove { username } => cmd_user_remove(s, &username).map(drop),
            UserCommand::List => cmd_user_list(s).map(drop),
        },
        Commands::Alerts => cmd_alerts(s).map(drop),
        Commands::Status => cmd_status(s).map(drop),
        Commands::Export { path, format } => cmd_export(s, &path, &format).map(drop),
        Commands::Import { path } => cmd_import(s, &path).map(drop),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn emit<T: Serialize>(settings: &Settings, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if settings.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        let rendered = text(value);
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }
    Ok(())
}

fn machine_line(m: &Machine) -> String {
    format!(
        "{:<4} {:<28} {:<10} {:>7}h  next {} @ {}h  fuel {:>4}  {}{}",
        m.id.to_string(),
        m.name,
        m.plate,
        m.current_hm,
        m.next_pm_type,
        m.next_pm_due_hm,
        m.fuel_level.to_string(),
        m.alert_level(),
        if m.is_in_use { "  [in use]" } else { "" },
    )
}

fn machine_detail(m: &Machine) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", m.id, m.name));
    out.push_str(&format!("  model:       {}\n", m.model));
    out.push_str(&format!("  plate:       {}\n", m.plate));
    out.push_str(&format!("  series:      {}\n", m.series));
    out.push_str(&format!("  hour-meter:  {}h\n", m.current_hm));
    out.push_str(&format!("  cycle step:  {} ({})\n", m.cycle_index, m.cycle_index.label()));
    out.push_str(&format!("  next PM:     {} due at {}h\n", m.next_pm_type, m.next_pm_due_hm));
    out.push_str(&format!("  last PM:     {} at {}h\n", m.last_pm, m.last_pm_hm));
    out.push_str(&format!("  fuel:        {}\n", m.fuel_level));
    out.push_str(&format!("  alert:       {}", m.alert_level()));
    if m.is_blocked() {
        out.push_str(&format!(" (blocked, {}h overdue)", m.hours_overdue()));
    }
    if m.is_in_use {
        out.push_str("\n  in use");
    }
    out
}

fn supply_line(s: &Supply) -> String {
    format!(
        "{:<4} {:<30} {:>6} {}{}",
        s.id.to_string(),
        s.name,
        s.stock,
        s.unit,
        if s.is_low_stock() { "  [low]" } else { "" }
    )
}

fn maintenance_line(r: &MaintenanceRecord) -> String {
    let pm = r.pm_type.map(|pm| pm.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{:<5} {} {:<24} {:<10} {:<4} {:>7}h  {}",
        r.id.to_string(),
        r.machine_id,
        r.machine_name,
        r.kind,
        pm,
        r.hm_done_at,
        r.description
    )
}

fn usage_line(r: &UsageRecord) -> String {
    format!(
        "{:<5} {} {:<24} {:<12} {}h -> {}h (+{}h)  fuel {} -> {}  {}",
        r.id.to_string(),
        r.machine_id,
        r.machine_name,
        r.operator,
        r.start_hm,
        r.end_hm,
        r.hours_added,
        r.start_fuel,
        r.end_fuel,
        r.duration_text
    )
}

fn kit_lines(pm: PmType, kit: &PmKit) -> String {
    let mut out = format!("{pm}:");
    if kit.is_empty() {
        out.push_str(" (empty)");
    }
    for item in kit.items() {
        out.push_str(&format!(
            "\n  {:<4} {:<30} x{}{}",
            item.supply_id.to_string(),
            item.name,
            item.quantity,
            if item.is_mandatory { "  mandatory" } else { "" }
        ));
    }
    out
}

fn joined<T>(items: &[T], empty: &str, line: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.iter().map(line).collect::<Vec<_>>().join("\n")
    }
}

fn parse_pm(raw: &str) -> Result<PmType> {
    Ok(raw.parse::<PmType>()?)
}

fn parse_role(raw: &str) -> Result<Role> {
    Ok(raw.parse::<Role>()?)
}

// =============================================================================
// INIT
// =============================================================================

/// Create a new database with one administrator.
pub fn cmd_init(db_path: &Path, force: bool, admin: &str, seed: bool) -> Result<()> {
    let admin = admin.trim();
    if admin.is_empty() {
        return Err(CliError::InvalidArgument("admin username is empty".to_string()));
    }

    if db_path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(db_path.display().to_string()));
        }
        std::fs::remove_file(db_path)?;
    }

    let store = RedbFleet::create(db_path)?;
    let now = now_ms();
    store.add_user(admin, Role::Administrator, now)?;
    if seed {
        seed_demo_fleet(&store, now)?;
    }

    info!(db = %db_path.display(), admin, seed, "database initialized");
    println!("Initialized fleet database at {}", db_path.display());
    Ok(())
}

fn seed_demo_fleet(store: &RedbFleet, now: u64) -> Result<()> {
    store.register_machine(
        MachineDraft {
            name: "Excavadora Cat 320".to_string(),
            model: "320D".to_string(),
            plate: "CAT-001".to_string(),
            current_hm: 5120,
            cycle_index: Some(CycleIndex::new(3)),
            fuel_level: FuelLevel::new(75)?,
        },
        now,
    )?;
    store.register_machine(
        MachineDraft {
            name: "Cargador Frontal WA470".to_string(),
            model: "WA470-6".to_string(),
            plate: "KOM-992".to_string(),
            current_hm: 260,
            cycle_index: Some(CycleIndex::new(1)),
            fuel_level: FuelLevel::new(40)?,
        },
        now.saturating_add(1),
    )?;

    let oil = store.add_supply(SupplyDraft {
        name: "Engine oil SAE 15W-40".to_string(),
        unit: "liters".to_string(),
        stock: 150,
    })?;
    let filter = store.add_supply(SupplyDraft {
        name: "Oil filter (large)".to_string(),
        unit: "units".to_string(),
        stock: 80,
    })?;

    for pm in PmType::ALL {
        store.upsert_kit_item(pm, oil.id, 30, true)?;
        store.upsert_kit_item(pm, filter.id, 1, pm != PmType::Pm1)?;
    }

    store.add_user("operador", Role::Operator, now)?;
    store.add_user("visor", Role::Viewer, now)?;
    debug!("demo fleet seeded");
    Ok(())
}

// =============================================================================
// MACHINES
// =============================================================================

/// Recommended cycle step for a reading. Needs no database.
pub fn cmd_recommend(settings: &Settings, hm: u64) -> Result<CycleIndex> {
    let index = recommended_cycle_index(hm);
    emit(settings, &index, |i| {
        format!("{hm}h -> cycle index {i}: {}", i.label())
    })?;
    Ok(index)
}

pub fn cmd_machine_add(settings: &Settings, draft: MachineDraft) -> Result<Machine> {
    let session = FleetSession::open(settings)?;
    session.require(Action::CreateMachine)?;
    let machine = session.store().register_machine(draft, now_ms())?;
    info!(machine = %machine.id, name = %machine.name, index = %machine.cycle_index, "machine registered");
    emit(settings, &machine, |m| format!("Registered {}", machine_line(m)))?;
    Ok(machine)
}

pub fn cmd_machine_edit(settings: &Settings, id: MachineId, edit: MachineEdit) -> Result<Machine> {
    let session = FleetSession::open(settings)?;
    session.require(Action::EditMachine)?;
    let machine = session.store().edit_machine(id, edit)?;
    info!(machine = %id, hm = machine.current_hm, due = machine.next_pm_due_hm, "machine edited");
    emit(settings, &machine, |m| format!("Updated {}", machine_line(m)))?;
    Ok(machine)
}

pub fn cmd_machine_list(settings: &Settings) -> Result<Vec<Machine>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let machines = session.store().machines()?;
    debug!(count = machines.len(), "machines listed");
    emit(settings, &machines, |list| joined(list, "No machines.", machine_line))?;
    Ok(machines)
}

pub fn cmd_machine_show(settings: &Settings, id: MachineId) -> Result<Machine> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let machine = session.store().machine(id)?;
    emit(settings, &machine, machine_detail)?;
    Ok(machine)
}

pub fn cmd_machine_delete(settings: &Settings, id: MachineId) -> Result<Machine> {
    let session = FleetSession::open(settings)?;
    session.require(Action::DeleteMachine)?;
    let machine = session.store().delete_machine(id)?;
    info!(machine = %id, "machine deleted");
    emit(settings, &machine, |m| format!("Deleted {} {}", m.id, m.name))?;
    Ok(machine)
}

pub fn cmd_machine_refuel(settings: &Settings, id: MachineId, level: u64) -> Result<Machine> {
    let session = FleetSession::open(settings)?;
    session.require(Action::Refuel)?;
    let machine = session.store().refuel(id, level)?;
    info!(machine = %id, fuel = machine.fuel_level.value(), "machine refuelled");
    emit(settings, &machine, |m| format!("{} refuelled to {}", m.name, m.fuel_level))?;
    Ok(machine)
}

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Merge the kit of the machine's next PM under the explicit lines.
fn with_kit_prefill(store: &RedbFleet, mut request: MaintenanceRequest) -> Result<MaintenanceRequest> {
    let machine = store.machine(request.machine_id)?;
    let kits = store.kit_config()?;
    let mut lines = kits
        .kit(machine.next_pm_type)
        .map(prefill_supplies)
        .unwrap_or_default();
    for line in &request.supplies_used {
        match lines.iter_mut().find(|l| l.supply_id == line.supply_id) {
            Some(existing) => *existing = *line,
            None => lines.push(*line),
        }
    }
    request.supplies_used = lines;
    Ok(request)
}

pub fn cmd_maintenance_register(
    settings: &Settings,
    request: MaintenanceRequest,
    prefill: bool,
) -> Result<MaintenanceRecord> {
    let session = FleetSession::open(settings)?;
    session.require(Action::RegisterMaintenance)?;

    let request = if prefill && request.kind == MaintenanceKind::Scheduled {
        with_kit_prefill(session.store(), request)?
    } else {
        request
    };

    let record = session.store().register_maintenance(&request, now_ms())?;
    info!(
        record = %record.id,
        machine = %record.machine_id,
        kind = %record.kind,
        hm = record.hm_done_at,
        supplies = record.supplies_used.len(),
        "maintenance registered"
    );
    emit(settings, &record, |r| {
        let mut out = format!("Registered {}", maintenance_line(r));
        for usage in &r.supplies_used {
            out.push_str(&format!("\n  used {} x{}", usage.name, usage.quantity));
        }
        out
    })?;
    Ok(record)
}

pub fn cmd_maintenance_history(
    settings: &Settings,
    machine: Option<MachineId>,
    kind: Option<&str>,
) -> Result<Vec<MaintenanceRecord>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let kind = kind.map(str::parse::<MaintenanceKind>).transpose()?;
    let records = session.store().maintenance_history(machine, kind)?;
    debug!(count = records.len(), "maintenance history listed");
    emit(settings, &records, |list| {
        joined(list, "No maintenance recorded.", maintenance_line)
    })?;
    Ok(records)
}

// =============================================================================
// JOBS
// =============================================================================

pub fn cmd_job_start(settings: &Settings, machine: MachineId) -> Result<OpenJob> {
    let session = FleetSession::open(settings)?;
    session.require(Action::OperateJobs)?;
    let operator = session.actor().username.clone();
    let job = session.store().start_job(machine, &operator, now_ms())?;
    info!(machine = %machine, operator = %operator, hm = job.start_hm, "job started");
    emit(settings, &job, |j| {
        format!(
            "Started job on {} {} at {}h, fuel {}",
            j.machine_id, j.machine_name, j.start_hm, j.start_fuel
        )
    })?;
    Ok(job)
}

pub fn cmd_job_end(settings: &Settings, close: JobClose) -> Result<UsageRecord> {
    let session = FleetSession::open(settings)?;
    session.require(Action::OperateJobs)?;
    let operator = session.actor().username.clone();
    let record = session.store().end_job(&operator, &close, now_ms())?;
    info!(
        record = %record.id,
        machine = %record.machine_id,
        operator = %operator,
        hours = record.hours_added,
        "job closed"
    );
    emit(settings, &record, |r| format!("Closed {}", usage_line(r)))?;
    Ok(record)
}

pub fn cmd_job_list(settings: &Settings) -> Result<Vec<OpenJob>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let jobs = session.store().open_jobs()?;
    emit(settings, &jobs, |list| {
        joined(list, "No open jobs.", |j| {
            format!(
                "{} {:<24} {:<12} since {}h",
                j.machine_id, j.machine_name, j.operator, j.start_hm
            )
        })
    })?;
    Ok(jobs)
}

pub fn cmd_usage_history(settings: &Settings, machine: Option<MachineId>) -> Result<Vec<UsageRecord>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let records = session.store().usage_history(machine)?;
    debug!(count = records.len(), "usage history listed");
    emit(settings, &records, |list| joined(list, "No usage recorded.", usage_line))?;
    Ok(records)
}

// =============================================================================
// KITS
// =============================================================================

pub fn cmd_kit_show(settings: &Settings, pm: Option<&str>) -> Result<KitConfig> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let mut config = session.store().kit_config()?;
    if let Some(raw) = pm {
        let pm = parse_pm(raw)?;
        let kit = config.kit(pm).cloned().unwrap_or_default();
        config = KitConfig::new();
        config.set(pm, kit);
    }
    emit(settings, &config, |c| {
        let lines: Vec<String> = c.iter().map(|(pm, kit)| kit_lines(pm, kit)).collect();
        if lines.is_empty() {
            "No kits configured.".to_string()
        } else {
            lines.join("\n")
        }
    })?;
    Ok(config)
}

pub fn cmd_kit_add(
    settings: &Settings,
    pm: &str,
    supply: SupplyId,
    quantity: u64,
    mandatory: bool,
) -> Result<PmKit> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ManageKits)?;
    let pm = parse_pm(pm)?;
    let kit = session
        .store()
        .upsert_kit_item(pm, supply, quantity, mandatory)?;
    info!(pm = %pm, supply = %supply, quantity, mandatory, "kit item set");
    emit(settings, &kit, |k| kit_lines(pm, k))?;
    Ok(kit)
}

pub fn cmd_kit_remove(settings: &Settings, pm: &str, supply: SupplyId) -> Result<KitItem> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ManageKits)?;
    let pm = parse_pm(pm)?;
    let item = session.store().remove_kit_item(pm, supply)?;
    info!(pm = %pm, supply = %supply, "kit item removed");
    emit(settings, &item, |i| format!("Removed {} from {pm}", i.name))?;
    Ok(item)
}

// =============================================================================
// SUPPLIES
// =============================================================================

pub fn cmd_supply_add(settings: &Settings, draft: SupplyDraft) -> Result<Supply> {
    let session = FleetSession::open(settings)?;
    session.require(Action::CreateSupply)?;
    let supply = session.store().add_supply(draft)?;
    info!(supply = %supply.id, name = %supply.name, stock = supply.stock, "supply added");
    emit(settings, &supply, |s| format!("Added {}", supply_line(s)))?;
    Ok(supply)
}

pub fn cmd_supply_edit(settings: &Settings, id: SupplyId, edit: SupplyEdit) -> Result<Supply> {
    let session = FleetSession::open(settings)?;
    session.require(Action::EditSupply)?;
    let supply = session.store().edit_supply(id, edit)?;
    info!(supply = %id, "supply edited");
    emit(settings, &supply, |s| format!("Updated {}", supply_line(s)))?;
    Ok(supply)
}

pub fn cmd_supply_restock(settings: &Settings, id: SupplyId, quantity: u64) -> Result<Supply> {
    let session = FleetSession::open(settings)?;
    session.require(Action::RestockSupply)?;
    let supply = session.store().restock(id, quantity)?;
    info!(supply = %id, quantity, stock = supply.stock, "supply restocked");
    emit(settings, &supply, |s| format!("Restocked {}", supply_line(s)))?;
    Ok(supply)
}

pub fn cmd_supply_delete(settings: &Settings, id: SupplyId) -> Result<Supply> {
    let session = FleetSession::open(settings)?;
    session.require(Action::DeleteSupply)?;
    let supply = session.store().delete_supply(id)?;
    info!(supply = %id, "supply deleted");
    emit(settings, &supply, |s| format!("Deleted {} {}", s.id, s.name))?;
    Ok(supply)
}

pub fn cmd_supply_list(settings: &Settings, low_only: bool) -> Result<Vec<Supply>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let mut supplies = session.store().supplies()?;
    if low_only {
        supplies.retain(Supply::is_low_stock);
    }
    emit(settings, &supplies, |list| joined(list, "No supplies.", supply_line))?;
    Ok(supplies)
}

// =============================================================================
// USERS
// =============================================================================

pub fn cmd_user_add(settings: &Settings, username: &str, role: &str) -> Result<User> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ManageUsers)?;
    let role = parse_role(role)?;
    if username.trim().is_empty() {
        return Err(CliError::InvalidArgument("username is empty".to_string()));
    }
    let user = session.store().add_user(username, role, now_ms())?;
    info!(user = %user.username, role = %user.role, "user added");
    emit(settings, &user, |u| format!("Added {} ({})", u.username, u.role))?;
    Ok(user)
}

pub fn cmd_user_role(settings: &Settings, username: &str, role: &str) -> Result<User> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ManageUsers)?;
    let role = parse_role(role)?;
    let user = session.store().set_role(username, role)?;
    info!(user = %user.username, role = %user.role, "user role changed");
    emit(settings, &user, |u| format!("{} is now {}", u.username, u.role))?;
    Ok(user)
}

pub fn cmd_user_remove(settings: &Settings, username: &str) -> Result<User> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ManageUsers)?;
    if session.actor().username == username {
        return Err(CliError::InvalidArgument(
            "cannot remove the acting user".to_string(),
        ));
    }
    let user = session.store().remove_user(username)?;
    info!(user = %user.username, "user removed");
    emit(settings, &user, |u| format!("Removed {}", u.username))?;
    Ok(user)
}

pub fn cmd_user_list(settings: &Settings) -> Result<Vec<User>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let users = session.store().users()?;
    emit(settings, &users, |list| {
        joined(list, "No users.", |u| format!("{:<4} {:<16} {}", u.id.to_string(), u.username, u.role))
    })?;
    Ok(users)
}

// =============================================================================
// STATUS
// =============================================================================

pub fn cmd_alerts(settings: &Settings) -> Result<Vec<Notification>> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let notifications = session.store().notifications()?;
    emit(settings, &notifications, |list| {
        joined(list, "No alerts.", |n| {
            format!("[{:<8}] {} ({})", n.level.as_str(), n.message, n.detail)
        })
    })?;
    Ok(notifications)
}

pub fn cmd_status(settings: &Settings) -> Result<FleetOverview> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let overview = session.store().overview()?;
    emit(settings, &overview, |o| {
        let mut out = String::new();
        out.push_str(&format!("Machines:        {}\n", o.total_machines));
        out.push_str(&format!("In use:          {}\n", o.machines_in_use));
        out.push_str(&format!("Critical alerts: {}\n", o.critical_alerts));
        out.push_str(&format!("Warning alerts:  {}\n", o.warning_alerts));
        out.push_str(&format!("Low-stock items: {}\n", o.low_stock.len()));
        out.push_str(&format!("Hours logged:    {}h\n", o.total_hours_logged));
        out.push_str("Recent maintenance:\n");
        out.push_str(&joined(&o.recent_maintenance, "  (none)", |r| {
            format!("  {}", maintenance_line(r))
        }));
        out
    })?;
    Ok(overview)
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Write every record to `path`. Returns the number of records written.
pub fn cmd_export(settings: &Settings, path: &Path, format: &str) -> Result<usize> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ViewFleet)?;
    let snapshot = session.store().snapshot()?;

    let bytes = match format.to_ascii_lowercase().as_str() {
        "canonical" => export_canonical(&snapshot)?,
        "json" => serde_json::to_vec_pretty(&snapshot)?,
        other => return Err(CliError::UnsupportedFormat(other.to_string())),
    };
    std::fs::write(path, &bytes)?;

    let count = snapshot.record_count();
    info!(path = %path.display(), format, records = count, bytes = bytes.len(), "fleet exported");
    if !settings.json {
        println!("Exported {count} records to {}", path.display());
    }
    Ok(count)
}

/// Replace the store with an export file. The format is detected from its header.
pub fn cmd_import(settings: &Settings, path: &Path) -> Result<usize> {
    let session = FleetSession::open(settings)?;
    session.require(Action::ImportData)?;

    let bytes = std::fs::read(path)?;
    let snapshot: FleetSnapshot = if bytes.starts_with(&SNAPSHOT_MAGIC) {
        import_canonical(&bytes)?
    } else {
        serde_json::from_slice(&bytes)?
    };
    session.store().restore(&snapshot)?;

    let count = snapshot.record_count();
    info!(path = %path.display(), records = count, "fleet imported");
    if !settings.json {
        println!("Imported {count} records from {}", path.display());
    }
    Ok(count)
}

// =============================================================================
// TESTS
// =============================================================================
