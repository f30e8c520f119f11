//! Machines, spindles, materials and bits: list, view, create, edit, delete.

use cnc_common::{
    sort_newest_first, Bit, BitPayload, EntityId, Machine, MachinePayload, Material,
    MaterialPayload, Resource, Spindle, SpindlePayload,
};
use tracing::info;

use super::{parse_number, refuse, settle, ConfirmDialog, FormDialog, FormMode};
use crate::{AdminApi, AdminResult, ValidationError, ViewScope};

/// A collection editable through the shared form dialog.
pub trait EditableResource: Resource {
    /// Raw text of the form inputs.
    type Form: Default + Clone + Send + Sync;

    fn to_form(&self) -> Self::Form;

    fn parse_form(form: &Self::Form) -> Result<Self::Payload, ValidationError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameForm {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineForm {
    pub name: String,
    pub multiplier: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitForm {
    pub name: String,
    pub bit_dia_for_calc: String,
    pub stepover_ratio: String,
}

impl EditableResource for Machine {
    type Form = MachineForm;

    fn to_form(&self) -> MachineForm {
        MachineForm {
            name: self.name.clone(),
            multiplier: self.multiplier.to_string(),
        }
    }

    fn parse_form(form: &MachineForm) -> Result<MachinePayload, ValidationError> {
        Ok(MachinePayload {
            name: form.name.clone(),
            multiplier: parse_number("Multiplier", &form.multiplier)?,
        })
    }
}

impl EditableResource for Spindle {
    type Form = NameForm;

    fn to_form(&self) -> NameForm {
        NameForm { name: self.name.clone() }
    }

    fn parse_form(form: &NameForm) -> Result<SpindlePayload, ValidationError> {
        Ok(SpindlePayload { name: form.name.clone() })
    }
}

impl EditableResource for Material {
    type Form = NameForm;

    fn to_form(&self) -> NameForm {
        NameForm { name: self.name.clone() }
    }

    fn parse_form(form: &NameForm) -> Result<MaterialPayload, ValidationError> {
        Ok(MaterialPayload { name: form.name.clone() })
    }
}

impl EditableResource for Bit {
    type Form = BitForm;

    fn to_form(&self) -> BitForm {
        BitForm {
            name: self.name.clone(),
            bit_dia_for_calc: self.bit_dia_for_calc.to_string(),
            stepover_ratio: self.stepover_ratio.to_string(),
        }
    }

    fn parse_form(form: &BitForm) -> Result<BitPayload, ValidationError> {
        Ok(BitPayload {
            name: form.name.clone(),
            bit_dia_for_calc: parse_number("Bit diameter", &form.bit_dia_for_calc)?,
            stepover_ratio: parse_number("Stepover ratio", &form.stepover_ratio)?,
        })
    }
}

/// Screen controller for one reference collection.
pub struct EntityController<R: EditableResource, A: AdminApi> {
    api: A,
    scope: ViewScope,
    rows: Vec<R>,
    detail: Option<R>,
    form: Option<FormDialog<R::Form>>,
    confirm: Option<ConfirmDialog>,
    error: Option<String>,
}

pub type MachinesController<A> = EntityController<Machine, A>;
pub type SpindlesController<A> = EntityController<Spindle, A>;
pub type MaterialsController<A> = EntityController<Material, A>;
pub type BitsController<A> = EntityController<Bit, A>;

impl<R: EditableResource, A: AdminApi> EntityController<R, A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            rows: Vec::new(),
            detail: None,
            form: None,
            confirm: None,
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// The view is going away; pending requests are dropped.
    pub fn close(&self) {
        self.scope.close();
    }

    /// Rows newest first.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn row(&self, id: EntityId) -> Option<&R> {
        self.rows.iter().find(|r| r.record_id() == id)
    }

    pub fn detail(&self) -> Option<&R> {
        self.detail.as_ref()
    }

    pub fn form(&self) -> Option<&FormDialog<R::Form>> {
        self.form.as_ref()
    }

    /// Inputs of the open form, for editing.
    pub fn fields_mut(&mut self) -> Option<&mut R::Form> {
        self.form.as_mut().map(|f| &mut f.fields)
    }

    pub fn confirmation(&self) -> Option<&ConfirmDialog> {
        self.confirm.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn plural() -> String {
        format!("{}s", R::LABEL)
    }

    pub async fn load(&mut self) -> AdminResult<()> {
        let result = self.scope.run(self.api.list::<R>()).await;
        let mut rows = settle(&mut self.error, result, |e| {
            e.with_status(&format!("load {}", Self::plural()))
        })?;
        sort_newest_first(&mut rows);
        self.rows = rows;
        self.error = None;
        Ok(())
    }

    pub async fn view(&mut self, id: EntityId) -> AdminResult<()> {
        let result = self.scope.run(self.api.get::<R>(id)).await;
        let record = settle(&mut self.error, result, |e| e.with_status(&format!("load {}", R::LABEL)))?;
        self.detail = Some(record);
        Ok(())
    }

    pub fn close_view(&mut self) {
        self.detail = None;
    }

    pub fn open_create(&mut self) {
        self.form = Some(FormDialog::new(FormMode::Create, R::Form::default()));
    }

    pub fn open_edit(&mut self, id: EntityId) -> AdminResult<()> {
        let row = self
            .row(id)
            .ok_or(ValidationError::NothingSelected(R::LABEL))?;
        self.form = Some(FormDialog::new(FormMode::Edit(id), row.to_form()));
        Ok(())
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    /// POST or PUT the open form, then re-fetch the list.
    pub async fn submit_form(&mut self) -> AdminResult<()> {
        let form = self.form.as_mut().ok_or(ValidationError::DialogClosed)?;
        form.begin_submit()?;
        let payload = match R::parse_form(&form.fields) {
            Ok(payload) => payload,
            Err(e) => {
                form.fail(e.to_string());
                return Err(refuse(&mut self.error, e));
            }
        };
        let mode = form.mode;

        let (action, result) = match mode {
            FormMode::Create => (
                format!("create {}", R::LABEL),
                self.scope.run(self.api.create::<R>(&payload)).await,
            ),
            FormMode::Edit(id) => (
                format!("update {}", R::LABEL),
                self.scope.run(self.api.update::<R>(id, &payload)).await,
            ),
        };

        if let Err(e) = settle(&mut self.error, result, |e| e.brief(&action)) {
            if !e.is_cancelled() {
                if let Some(form) = self.form.as_mut() {
                    form.fail(self.error.clone().unwrap_or_default());
                }
            }
            return Err(e);
        }

        info!("Request to {} succeeded", action);
        self.form = None;
        self.load().await
    }

    pub fn request_delete(&mut self, id: EntityId) -> AdminResult<()> {
        let row = self
            .row(id)
            .ok_or(ValidationError::NothingSelected(R::LABEL))?;
        self.confirm = Some(ConfirmDialog::new(R::LABEL, row));
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
        let result = self.scope.run(self.api.delete::<R>(target)).await;
        settle(&mut self.error, result, |e| e.brief(&format!("delete {}", R::LABEL)))?;

        info!("Deleted {} {}", R::LABEL, target);
        self.confirm = None;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_form_round_trips_numbers_as_text() {
        let machine = Machine { id: 1, name: "Shapeoko".to_string(), multiplier: 1.2 };
        let form = machine.to_form();
        assert_eq!(form.multiplier, "1.2");
        let payload = Machine::parse_form(&form).unwrap();
        assert_eq!(payload, MachinePayload { name: "Shapeoko".to_string(), multiplier: 1.2 });
    }

    #[test]
    fn blank_number_is_rejected() {
        let form = BitForm {
            name: "Downcut".to_string(),
            bit_dia_for_calc: "0.25".to_string(),
            stepover_ratio: String::new(),
        };
        assert_eq!(
            Bit::parse_form(&form),
            Err(ValidationError::NotANumber("Stepover ratio"))
        );
    }
}
