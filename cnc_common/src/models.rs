//! Reference entities and account records served by the admin API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{BitPayload, MachinePayload, MaterialPayload, SettingPayload, SpindlePayload};

/// Numeric record id as issued by the API.
pub type EntityId = i64;

/// Anything rendered as a table row: it has an id and a display name.
pub trait Record {
    fn record_id(&self) -> EntityId;

    /// Name quoted in confirmation prompts.
    fn display_name(&self) -> String;
}

/// A CRUD collection under `/admin/cnc/`.
pub trait Resource: Record + Clone + DeserializeOwned + Send + Sync + 'static {
    /// Body sent on create (POST) and full replace (PUT).
    type Payload: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Path segment of the collection, e.g. `machines`.
    const COLLECTION: &'static str;

    /// Singular noun used in operator messages, e.g. `machine`.
    const LABEL: &'static str;
}

/// Sort rows strictly descending by id, newest first, whatever order the server used.
pub fn sort_newest_first<T: Record>(items: &mut [T]) {
    items.sort_by(|a, b| b.record_id().cmp(&a.record_id()));
}

/// A CNC machine. The multiplier scales calculated feeds and speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: EntityId,
    pub name: String,
    pub multiplier: f64,
}

/// Spindle (router/motor unit). Settings are scoped per spindle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spindle {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: EntityId,
    pub name: String,
}

/// Cutting bit with the geometry the calculation engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bit {
    pub id: EntityId,
    pub name: String,
    pub bit_dia_for_calc: f64,
    pub stepover_ratio: f64,
}

/// Curated cut parameters for one spindle + bit + material combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub setting_id: EntityId,
    pub spindle_id: EntityId,
    #[serde(default)]
    pub spindle_name: String,
    pub bit_id: EntityId,
    #[serde(default)]
    pub bit_name: String,
    pub material_id: EntityId,
    #[serde(default)]
    pub material_name: String,
    pub rpm: f64,
    pub feed: f64,
    pub doc: f64,
    pub stepover: f64,
    pub plunge: f64,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Account holding the admin role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: String,
}

/// Registered user of the public site. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: String,
}

impl User {
    /// Role shown in the table; derived, never stored.
    pub fn role_label(&self) -> &'static str {
        if self.is_admin {
            "Admin"
        } else {
            "User"
        }
    }
}

impl Record for Machine {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Record for Spindle {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Record for Material {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Record for Bit {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Record for Setting {
    fn record_id(&self) -> EntityId {
        self.setting_id
    }

    fn display_name(&self) -> String {
        format!("{} / {}", self.bit_name, self.material_name)
    }
}

impl Record for AdminUser {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Record for User {
    fn record_id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

impl Resource for Machine {
    type Payload = MachinePayload;
    const COLLECTION: &'static str = "machines";
    const LABEL: &'static str = "machine";
}

impl Resource for Spindle {
    type Payload = SpindlePayload;
    const COLLECTION: &'static str = "spindles";
    const LABEL: &'static str = "spindle";
}

impl Resource for Material {
    type Payload = MaterialPayload;
    const COLLECTION: &'static str = "materials";
    const LABEL: &'static str = "material";
}

impl Resource for Bit {
    type Payload = BitPayload;
    const COLLECTION: &'static str = "bits";
    const LABEL: &'static str = "bit";
}

impl Resource for Setting {
    type Payload = SettingPayload;
    const COLLECTION: &'static str = "settings";
    const LABEL: &'static str = "setting";
}
