//! Explicit navigation state shared between admin screens.
//!
//! The spindle picked on the spindle list is handed to the settings screen
//! as a `SpindleScope` value; nothing is read from ambient storage.

use cnc_common::{Bit, EntityId, Material, Spindle};

/// Id and name of a picked row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picked {
    pub id: EntityId,
    pub name: String,
}

/// The spindle whose settings a screen administers.
pub type SpindleScope = Picked;

impl From<&Spindle> for Picked {
    fn from(s: &Spindle) -> Self {
        Self { id: s.id, name: s.name.clone() }
    }
}

impl From<&Material> for Picked {
    fn from(m: &Material) -> Self {
        Self { id: m.id, name: m.name.clone() }
    }
}

impl From<&Bit> for Picked {
    fn from(b: &Bit) -> Self {
        Self { id: b.id, name: b.name.clone() }
    }
}

/// Rows picked on earlier screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub spindle: Option<Picked>,
    pub material: Option<Picked>,
    pub bit: Option<Picked>,
}

/// Admin screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Dashboard,
    Machines,
    Spindles,
    Materials,
    Bits,
    Settings,
    SpindleSettings(SpindleScope),
    Admins,
    Users,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    route: Route,
    selection: Selection,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn go(&mut self, route: Route) {
        self.route = route;
    }

    /// Remember the spindle and open its settings screen.
    pub fn select_spindle(&mut self, spindle: &Spindle) -> SpindleScope {
        let scope = SpindleScope::from(spindle);
        self.selection.spindle = Some(scope.clone());
        self.route = Route::SpindleSettings(scope.clone());
        scope
    }

    pub fn select_material(&mut self, material: &Material) {
        self.selection.material = Some(material.into());
    }

    pub fn select_bit(&mut self, bit: &Bit) {
        self.selection.bit = Some(bit.into());
    }

    /// Scope handed to the spindle settings screen, if a spindle is picked.
    pub fn spindle_scope(&self) -> Option<SpindleScope> {
        self.selection.spindle.clone()
    }

    /// After the spindle is deleted: forget it (only it) and return to the spindle list.
    pub fn spindle_deleted(&mut self) {
        self.selection.spindle = None;
        self.route = Route::Spindles;
    }
}
