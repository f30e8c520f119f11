//! In-memory state of the simulated admin API.
//!
//! Holds the reference tables, accounts and a log of every request the
//! simulator served, plus one-shot failure injection and artificial latency.

use cnc_common::{
    Bit, BitPayload, EntityId, FaqVideo, Machine, MachinePayload, Material, MaterialPayload,
    Resource, Setting, SettingPayload, Spindle, SpindlePayload, User,
};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Error type for store operations, mapped to HTTP statuses by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound(String),
    Invalid(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "{}", msg),
            StoreError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// A request as seen by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// One-shot failure returned instead of the real handler.
#[derive(Debug, Clone)]
pub struct Fault {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub body: String,
}

/// Body received by one of the public-site endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub endpoint: String,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct SimState {
    next_id: EntityId,
    pub machines: Vec<Machine>,
    pub spindles: Vec<Spindle>,
    pub materials: Vec<Material>,
    pub bits: Vec<Bit>,
    pub settings: Vec<Setting>,
    pub users: Vec<User>,
    pub submissions: Vec<Submission>,
    pub faq_video: Option<FaqVideo>,
    requests: Vec<RecordedRequest>,
    faults: Vec<Fault>,
    latency: Option<Duration>,
    token: Option<String>,
}

/// A collection the simulator can serve with the generic CRUD handlers.
pub trait SimResource: Resource + Serialize {
    fn table(state: &mut SimState) -> &mut Vec<Self>;

    /// Build a record with `id` from a create/update body.
    fn build(state: &SimState, id: EntityId, payload: Self::Payload) -> Result<Self, StoreError>;
}

impl SimResource for Machine {
    fn table(state: &mut SimState) -> &mut Vec<Self> {
        &mut state.machines
    }

    fn build(_: &SimState, id: EntityId, p: MachinePayload) -> Result<Self, StoreError> {
        Ok(Machine { id, name: p.name, multiplier: p.multiplier })
    }
}

impl SimResource for Spindle {
    fn table(state: &mut SimState) -> &mut Vec<Self> {
        &mut state.spindles
    }

    fn build(_: &SimState, id: EntityId, p: SpindlePayload) -> Result<Self, StoreError> {
        Ok(Spindle { id, name: p.name })
    }
}

impl SimResource for Material {
    fn table(state: &mut SimState) -> &mut Vec<Self> {
        &mut state.materials
    }

    fn build(_: &SimState, id: EntityId, p: MaterialPayload) -> Result<Self, StoreError> {
        Ok(Material { id, name: p.name })
    }
}

impl SimResource for Bit {
    fn table(state: &mut SimState) -> &mut Vec<Self> {
        &mut state.bits
    }

    fn build(_: &SimState, id: EntityId, p: BitPayload) -> Result<Self, StoreError> {
        Ok(Bit {
            id,
            name: p.name,
            bit_dia_for_calc: p.bit_dia_for_calc,
            stepover_ratio: p.stepover_ratio,
        })
    }
}

impl SimResource for Setting {
    fn table(state: &mut SimState) -> &mut Vec<Self> {
        &mut state.settings
    }

    /// Resolves the spindle/bit/material names; unknown references are rejected.
    fn build(state: &SimState, id: EntityId, p: SettingPayload) -> Result<Self, StoreError> {
        let spindle = state
            .spindles
            .iter()
            .find(|s| s.id == p.spindle_id)
            .ok_or_else(|| StoreError::Invalid(format!("Unknown spindle {}", p.spindle_id)))?;
        let bit = state
            .bits
            .iter()
            .find(|b| b.id == p.bit_id)
            .ok_or_else(|| StoreError::Invalid(format!("Unknown bit {}", p.bit_id)))?;
        let material = state
            .materials
            .iter()
            .find(|m| m.id == p.material_id)
            .ok_or_else(|| StoreError::Invalid(format!("Unknown material {}", p.material_id)))?;

        Ok(Setting {
            setting_id: id,
            spindle_id: spindle.id,
            spindle_name: spindle.name.clone(),
            bit_id: bit.id,
            bit_name: bit.name.clone(),
            material_id: material.id,
            material_name: material.name.clone(),
            rpm: p.rpm,
            feed: p.feed,
            doc: p.doc,
            stepover: p.stepover,
            plunge: p.plunge,
            warning: p.warning,
        })
    }
}

impl SimState {
    pub fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    // ========== Generic CRUD ==========

    pub fn list<R: SimResource>(&mut self) -> Vec<R> {
        R::table(self).clone()
    }

    pub fn get<R: SimResource>(&mut self, id: EntityId) -> Option<R> {
        R::table(self).iter().find(|r| r.record_id() == id).cloned()
    }

    pub fn create<R: SimResource>(&mut self, payload: R::Payload) -> Result<R, StoreError> {
        let id = self.allocate_id();
        let record = R::build(self, id, payload)?;
        R::table(self).push(record.clone());
        Ok(record)
    }

    pub fn update<R: SimResource>(&mut self, id: EntityId, payload: R::Payload) -> Result<R, StoreError> {
        if self.get::<R>(id).is_none() {
            return Err(StoreError::NotFound(format!("{} {} not found", R::LABEL, id)));
        }
        let record = R::build(self, id, payload)?;
        if let Some(slot) = R::table(self).iter_mut().find(|r| r.record_id() == id) {
            *slot = record.clone();
        }
        Ok(record)
    }

    pub fn delete<R: SimResource>(&mut self, id: EntityId) -> Result<(), StoreError> {
        let table = R::table(self);
        let before = table.len();
        table.retain(|r| r.record_id() != id);
        if table.len() == before {
            return Err(StoreError::NotFound(format!("{} {} not found", R::LABEL, id)));
        }
        Ok(())
    }

    // ========== Settings ==========

    pub fn settings_for_spindle(&self, spindle_id: EntityId) -> Vec<Setting> {
        self.settings
            .iter()
            .filter(|s| s.spindle_id == spindle_id)
            .cloned()
            .collect()
    }

    /// Remove the spindle together with every setting that references it.
    /// Returns the number of settings removed.
    pub fn delete_spindle_cascade(&mut self, spindle_id: EntityId) -> Result<usize, StoreError> {
        if !self.spindles.iter().any(|s| s.id == spindle_id) {
            return Err(StoreError::NotFound(format!("spindle {} not found", spindle_id)));
        }
        let before = self.settings.len();
        self.settings.retain(|s| s.spindle_id != spindle_id);
        self.spindles.retain(|s| s.id != spindle_id);
        Ok(before - self.settings.len())
    }

    /// Import settings for one spindle from an uploaded CSV.
    ///
    /// Columns are matched by header name (the export format is accepted as-is):
    /// `Bit Id`, `Material Id`, `RPM`, `Feed`, `DOC`, `Stepover`, `Plunge`, optional `Warning`.
    /// The import is all-or-nothing; an existing row for the same bit and material is replaced.
    pub fn import_settings_csv(&mut self, spindle_id: EntityId, data: &[u8]) -> Result<usize, StoreError> {
        const REQUIRED: [&str; 7] = ["Bit Id", "Material Id", "RPM", "Feed", "DOC", "Stepover", "Plunge"];

        if !self.spindles.iter().any(|s| s.id == spindle_id) {
            return Err(StoreError::Invalid(format!("Unknown spindle {}", spindle_id)));
        }

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);
        let headers = reader
            .headers()
            .map_err(|e| StoreError::Invalid(format!("CSV format error: {}", e)))?
            .clone();
        let columns: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
        for col in REQUIRED {
            if !columns.contains_key(col) {
                return Err(StoreError::Invalid(format!("Missing required column: {}", col)));
            }
        }

        let mut payloads = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            // Line 1 is the header
            let line = idx + 2;
            let record = record.map_err(|e| StoreError::Invalid(format!("Line {}: {}", line, e)))?;
            let field = |name: &str| record.get(columns[name]).unwrap_or("");
            let id = |name: &str| {
                field(name)
                    .parse::<EntityId>()
                    .map_err(|_| StoreError::Invalid(format!("Line {}, column '{}': not an id", line, name)))
            };
            let number = |name: &str| {
                field(name)
                    .parse::<f64>()
                    .map_err(|_| StoreError::Invalid(format!("Line {}, column '{}': not a number", line, name)))
            };
            let warning = columns
                .get("Warning")
                .and_then(|&i| record.get(i))
                .filter(|w| !w.is_empty())
                .map(str::to_string);

            payloads.push(SettingPayload {
                spindle_id,
                bit_id: id("Bit Id")?,
                material_id: id("Material Id")?,
                rpm: number("RPM")?,
                feed: number("Feed")?,
                doc: number("DOC")?,
                stepover: number("Stepover")?,
                plunge: number("Plunge")?,
                warning,
            });
        }

        // Validate every reference before touching the table
        for (idx, p) in payloads.iter().enumerate() {
            Setting::build(self, 0, p.clone())
                .map_err(|e| StoreError::Invalid(format!("Line {}: {}", idx + 2, e)))?;
        }

        let count = payloads.len();
        for p in payloads {
            let existing = self
                .settings
                .iter()
                .find(|s| s.spindle_id == p.spindle_id && s.bit_id == p.bit_id && s.material_id == p.material_id)
                .map(|s| s.setting_id);
            match existing {
                Some(id) => {
                    self.update::<Setting>(id, p)?;
                }
                None => {
                    self.create::<Setting>(p)?;
                }
            }
        }
        Ok(count)
    }

    // ========== Accounts ==========

    pub fn admins(&self) -> Vec<cnc_common::AdminUser> {
        self.users
            .iter()
            .filter(|u| u.is_admin)
            .map(|u| cnc_common::AdminUser {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                created_at: u.created_at.clone(),
            })
            .collect()
    }

    pub fn set_admin(&mut self, email: &str, is_admin: bool) -> Result<(), StoreError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;
        user.is_admin = is_admin;
        Ok(())
    }

    // ========== Seeding ==========

    pub fn seed_machine(&mut self, name: &str, multiplier: f64) -> Machine {
        let id = self.allocate_id();
        let machine = Machine { id, name: name.to_string(), multiplier };
        self.machines.push(machine.clone());
        machine
    }

    pub fn seed_spindle(&mut self, name: &str) -> Spindle {
        let id = self.allocate_id();
        let spindle = Spindle { id, name: name.to_string() };
        self.spindles.push(spindle.clone());
        spindle
    }

    pub fn seed_material(&mut self, name: &str) -> Material {
        let id = self.allocate_id();
        let material = Material { id, name: name.to_string() };
        self.materials.push(material.clone());
        material
    }

    pub fn seed_bit(&mut self, name: &str, bit_dia_for_calc: f64, stepover_ratio: f64) -> Bit {
        let id = self.allocate_id();
        let bit = Bit { id, name: name.to_string(), bit_dia_for_calc, stepover_ratio };
        self.bits.push(bit.clone());
        bit
    }

    /// Insert a setting with a caller-chosen id (for ordering tests).
    pub fn seed_setting(&mut self, setting_id: EntityId, spindle: &Spindle, bit: &Bit, material: &Material) -> Setting {
        let setting = Setting {
            setting_id,
            spindle_id: spindle.id,
            spindle_name: spindle.name.clone(),
            bit_id: bit.id,
            bit_name: bit.name.clone(),
            material_id: material.id,
            material_name: material.name.clone(),
            rpm: 18000.0,
            feed: 100.0,
            doc: 0.125,
            stepover: 0.4,
            plunge: 30.0,
            warning: None,
        };
        self.next_id = self.next_id.max(setting_id + 1);
        self.settings.push(setting.clone());
        setting
    }

    pub fn seed_user(&mut self, name: &str, email: &str, is_admin: bool) -> User {
        let id = self.allocate_id();
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            is_admin,
            created_at: "2025-01-15T09:30:00Z".to_string(),
        };
        self.users.push(user.clone());
        user
    }

    // ========== Test controls ==========

    pub fn record(&mut self, request: RecordedRequest) {
        self.requests.push(request);
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    /// Fail the next `method path` request with `status` and a plain-text `body`.
    pub fn fail_next(&mut self, method: &str, path: &str, status: u16, body: &str) {
        self.faults.push(Fault {
            method: method.to_uppercase(),
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
    }

    pub fn take_fault(&mut self, method: &str, path: &str) -> Option<Fault> {
        let idx = self.faults.iter().position(|f| f.method == method && f.path == path)?;
        Some(self.faults.remove(idx))
    }

    pub fn set_latency(&mut self, latency: Option<Duration>) {
        self.latency = latency;
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Require this token on every authenticated route.
    pub fn require_token(&mut self, token: Option<&str>) {
        self.token = token.map(str::to_string);
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
