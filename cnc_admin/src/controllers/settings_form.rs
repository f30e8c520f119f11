//! Full settings form: every setting, with spindle/material/bit dropdowns.

use std::future::Future;

use cnc_common::{sort_newest_first, Bit, EntityId, Material, Setting, SettingPayload, Spindle};
use tracing::info;

use super::{parse_number, refuse, settle, ConfirmDialog, FormDialog, FormMode};
use crate::{AdminApi, AdminError, AdminResult, ValidationError, ViewScope};

/// Numeric and warning inputs of a setting, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingFields {
    pub rpm: String,
    pub feed: String,
    pub doc: String,
    pub stepover: String,
    pub plunge: String,
    pub warning: String,
}

impl SettingFields {
    pub fn from_setting(s: &Setting) -> Self {
        Self {
            rpm: s.rpm.to_string(),
            feed: s.feed.to_string(),
            doc: s.doc.to_string(),
            stepover: s.stepover.to_string(),
            plunge: s.plunge.to_string(),
            warning: s.warning.clone().unwrap_or_default(),
        }
    }

    /// Full record for POST/PUT. An empty warning is sent as null.
    pub fn to_payload(
        &self,
        spindle_id: EntityId,
        bit_id: EntityId,
        material_id: EntityId,
    ) -> Result<SettingPayload, ValidationError> {
        Ok(SettingPayload {
            spindle_id,
            bit_id,
            material_id,
            rpm: parse_number("RPM", &self.rpm)?,
            feed: parse_number("Feed", &self.feed)?,
            doc: parse_number("DOC", &self.doc)?,
            stepover: parse_number("Stepover", &self.stepover)?,
            plunge: parse_number("Plunge", &self.plunge)?,
            warning: if self.warning.is_empty() {
                None
            } else {
                Some(self.warning.clone())
            },
        })
    }
}

/// Dropdown choices of the create form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingSelection {
    pub spindle_id: Option<EntityId>,
    pub material_id: Option<EntityId>,
    pub bit_id: Option<EntityId>,
}

impl SettingSelection {
    pub fn is_complete(&self) -> bool {
        self.spindle_id.is_some() && self.material_id.is_some() && self.bit_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingForm {
    pub selection: SettingSelection,
    pub fields: SettingFields,
}

async fn tagged<T>(
    what: &'static str,
    request: impl Future<Output = AdminResult<T>>,
) -> Result<T, (&'static str, AdminError)> {
    request.await.map_err(|e| (what, e))
}

pub struct SettingsController<A: AdminApi> {
    api: A,
    scope: ViewScope,
    rows: Vec<Setting>,
    spindles: Vec<Spindle>,
    bits: Vec<Bit>,
    materials: Vec<Material>,
    detail: Option<Setting>,
    form: Option<FormDialog<SettingForm>>,
    confirm: Option<ConfirmDialog>,
    error: Option<String>,
}

impl<A: AdminApi> SettingsController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            rows: Vec::new(),
            spindles: Vec::new(),
            bits: Vec::new(),
            materials: Vec::new(),
            detail: None,
            form: None,
            confirm: None,
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn rows(&self) -> &[Setting] {
        &self.rows
    }

    pub fn spindles(&self) -> &[Spindle] {
        &self.spindles
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn detail(&self) -> Option<&Setting> {
        self.detail.as_ref()
    }

    pub fn form(&self) -> Option<&FormDialog<SettingForm>> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut SettingForm> {
        self.form.as_mut().map(|f| &mut f.fields)
    }

    pub fn confirmation(&self) -> Option<&ConfirmDialog> {
        self.confirm.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch settings, spindles, bits and materials together. The first
    /// failure fails the screen and nothing is shown.
    pub async fn load(&mut self) -> AdminResult<()> {
        let api = &self.api;
        let joint = async {
            tokio::try_join!(
                tagged("settings", api.list::<Setting>()),
                tagged("spindles", api.list::<Spindle>()),
                tagged("bits", api.list::<Bit>()),
                tagged("materials", api.list::<Material>())
            )
        };

        let (mut rows, mut spindles, mut bits, mut materials) = match self.scope.race(joint).await {
            None => return Err(AdminError::Cancelled),
            Some(Ok(loaded)) => loaded,
            Some(Err((what, e))) => {
                return settle(&mut self.error, Err(e), |e| e.with_status(&format!("load {}", what)));
            }
        };

        sort_newest_first(&mut rows);
        sort_newest_first(&mut spindles);
        sort_newest_first(&mut bits);
        sort_newest_first(&mut materials);
        self.rows = rows;
        self.spindles = spindles;
        self.bits = bits;
        self.materials = materials;
        self.error = None;
        Ok(())
    }

    /// Re-fetch only the settings list after a mutation.
    async fn reload_rows(&mut self) -> AdminResult<()> {
        let result = self.scope.run(self.api.list::<Setting>()).await;
        let mut rows = settle(&mut self.error, result, |e| e.with_status("load settings"))?;
        sort_newest_first(&mut rows);
        self.rows = rows;
        Ok(())
    }

    pub async fn view(&mut self, id: EntityId) -> AdminResult<()> {
        let result = self.scope.run(self.api.get::<Setting>(id)).await;
        self.detail = Some(settle(&mut self.error, result, |e| e.with_status("load setting"))?);
        Ok(())
    }

    pub fn close_view(&mut self) {
        self.detail = None;
    }

    pub fn open_create(&mut self) {
        self.form = Some(FormDialog::new(FormMode::Create, SettingForm::default()));
    }

    pub fn open_edit(&mut self, id: EntityId) -> AdminResult<()> {
        let row = self
            .rows
            .iter()
            .find(|s| s.setting_id == id)
            .ok_or(ValidationError::NothingSelected("setting"))?;
        let form = SettingForm {
            selection: SettingSelection {
                spindle_id: Some(row.spindle_id),
                material_id: Some(row.material_id),
                bit_id: Some(row.bit_id),
            },
            fields: SettingFields::from_setting(row),
        };
        self.form = Some(FormDialog::new(FormMode::Edit(id), form));
        Ok(())
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    /// Create needs all three dropdowns picked; edit keeps the record's own ids.
    pub fn can_submit(&self) -> bool {
        match &self.form {
            None => false,
            Some(form) => {
                form.can_submit()
                    && (matches!(form.mode, FormMode::Edit(_)) || form.fields.selection.is_complete())
            }
        }
    }

    fn payload(&self, form: &FormDialog<SettingForm>) -> Result<SettingPayload, ValidationError> {
        let (spindle_id, material_id, bit_id) = match form.mode {
            FormMode::Create => {
                let sel = form.fields.selection;
                match (sel.spindle_id, sel.material_id, sel.bit_id) {
                    (Some(s), Some(m), Some(b)) => (s, m, b),
                    _ => return Err(ValidationError::IncompleteSelection),
                }
            }
            FormMode::Edit(id) => {
                let original = self
                    .rows
                    .iter()
                    .find(|s| s.setting_id == id)
                    .ok_or(ValidationError::NothingSelected("setting"))?;
                (original.spindle_id, original.material_id, original.bit_id)
            }
        };
        form.fields.fields.to_payload(spindle_id, bit_id, material_id)
    }

    pub async fn submit(&mut self) -> AdminResult<()> {
        let form = self.form.as_ref().ok_or(ValidationError::DialogClosed)?;
        if !form.can_submit() {
            return Err(ValidationError::Busy.into());
        }
        let mode = form.mode;
        let payload = match self.payload(form) {
            Ok(payload) => payload,
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.fail(e.to_string());
                }
                return Err(refuse(&mut self.error, e));
            }
        };
        if let Some(form) = self.form.as_mut() {
            form.begin_submit()?;
        }

        let (action, result) = match mode {
            FormMode::Create => (
                "create setting",
                self.scope.run(self.api.create::<Setting>(&payload)).await,
            ),
            FormMode::Edit(id) => (
                "update setting",
                self.scope.run(self.api.update::<Setting>(id, &payload)).await,
            ),
        };
        if let Err(e) = settle(&mut self.error, result, |e| e.brief(action)) {
            if !e.is_cancelled() {
                if let Some(form) = self.form.as_mut() {
                    form.fail(self.error.clone().unwrap_or_default());
                }
            }
            return Err(e);
        }

        info!("Request to {} succeeded", action);
        self.form = None;
        self.error = None;
        self.reload_rows().await
    }

    pub fn request_delete(&mut self, id: EntityId) -> AdminResult<()> {
        let row = self
            .rows
            .iter()
            .find(|s| s.setting_id == id)
            .ok_or(ValidationError::NothingSelected("setting"))?;
        self.confirm = Some(ConfirmDialog::new("setting", row));
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.confirm = None;
    }

    pub async fn confirm_delete(&mut self) -> AdminResult<()> {
        let target = self
            .confirm
            .as_ref()
            .map(|c| c.target)
            .ok_or(ValidationError::DialogClosed)?;
        let result = self.scope.run(self.api.delete::<Setting>(target)).await;
        settle(&mut self.error, result, |e| e.brief("delete setting"))?;

        info!("Deleted setting {}", target);
        self.confirm = None;
        self.error = None;
        self.reload_rows().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> SettingFields {
        SettingFields {
            rpm: "18000".to_string(),
            feed: "120.5".to_string(),
            doc: "0.125".to_string(),
            stepover: "0.1".to_string(),
            plunge: "30".to_string(),
            warning: String::new(),
        }
    }

    #[test]
    fn empty_warning_becomes_null() {
        let payload = fields().to_payload(7, 2, 4).unwrap();
        assert_eq!(payload.warning, None);
        assert_eq!(payload.spindle_id, 7);
        assert_eq!(payload.bit_id, 2);
        assert_eq!(payload.material_id, 4);
        assert_eq!(payload.feed, 120.5);
    }

    #[test]
    fn selection_needs_all_three() {
        let mut sel = SettingSelection::default();
        assert!(!sel.is_complete());
        sel.spindle_id = Some(1);
        sel.material_id = Some(2);
        assert!(!sel.is_complete());
        sel.bit_id = Some(3);
        assert!(sel.is_complete());
    }

    #[test]
    fn non_numeric_field_is_named() {
        let mut f = fields();
        f.plunge = "slow".to_string();
        assert_eq!(f.to_payload(1, 2, 3), Err(ValidationError::NotANumber("Plunge")));
    }
}
