/// Integration tests for the machines/spindles/materials/bits screens and the
/// full settings form, against the in-process admin API simulator.
///
/// The tests verify:
/// 1. Lists are shown newest first and replaced wholesale after each mutation
/// 2. Failed submits keep the form open with the failure message
/// 3. Number inputs that do not parse are refused before any request
/// 4. Delete confirmations quote the record name
/// 5. The settings form loads its four lists jointly and fails as a whole
/// 6. Creating a setting needs all three pickers; editing keeps the record's ids

use cnc_admin::controllers::{
    BitsController, FormPhase, MachinesController, MaterialsController, SettingsController,
    SpindlesController,
};
use cnc_admin::{AdminConfig, HttpAdminApi, Navigator, Route};
use cnc_common::Machine;
use cnc_sim::{spawn, Sim, SimState};

async fn start(state: SimState) -> (HttpAdminApi, Sim) {
    let (url, sim) = spawn(state).await.expect("simulator should start");
    let api = HttpAdminApi::new(&AdminConfig::new(url)).expect("admin url is configured");
    (api, sim)
}

fn machines() -> SimState {
    let mut state = SimState::new();
    state.seed_machine("Shapeoko 4", 1.0);
    state.seed_machine("X-Carve Pro", 0.9);
    state.seed_machine("Onefinity", 1.1);
    state
}

#[tokio::test]
async fn list_is_sorted_newest_first() {
    let (api, _sim) = start(machines()).await;
    let mut ctl = MachinesController::new(api);
    ctl.load().await.unwrap();
    let ids: Vec<_> = ctl.rows().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn create_refetches_and_replaces_the_list() {
    let (api, sim) = start(machines()).await;
    let mut ctl = MachinesController::new(api);
    ctl.load().await.unwrap();

    ctl.open_create();
    {
        let form = ctl.fields_mut().unwrap();
        form.name = "Lowrider".to_string();
        form.multiplier = "0.8".to_string();
    }
    ctl.submit_form().await.unwrap();

    assert!(ctl.form().is_none());
    assert_eq!(ctl.rows().len(), 4);
    assert_eq!(
        ctl.rows()[0],
        Machine { id: 4, name: "Lowrider".to_string(), multiplier: 0.8 }
    );
    assert_eq!(sim.count_requests("GET", "/admin/cnc/machines").await, 2);
}

#[tokio::test]
async fn edit_leaves_no_stale_or_duplicate_rows() {
    let (api, _sim) = start(machines()).await;
    let mut ctl = MachinesController::new(api);
    ctl.load().await.unwrap();

    ctl.open_edit(2).unwrap();
    assert_eq!(ctl.fields_mut().unwrap().multiplier, "0.9");
    ctl.fields_mut().unwrap().multiplier = "1.5".to_string();
    ctl.submit_form().await.unwrap();

    let matching: Vec<_> = ctl.rows().iter().filter(|m| m.id == 2).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].multiplier, 1.5);
    assert_eq!(ctl.rows().len(), 3);
}

#[tokio::test]
async fn failed_submit_keeps_the_dialog_open() {
    let (api, sim) = start(machines()).await;
    sim.with(|s| s.fail_next("POST", "/admin/cnc/machines", 500, "boom")).await;
    let mut ctl = MachinesController::new(api);

    ctl.open_create();
    {
        let form = ctl.fields_mut().unwrap();
        form.name = "Lowrider".to_string();
        form.multiplier = "1".to_string();
    }
    assert!(ctl.submit_form().await.is_err());
    assert_eq!(ctl.error(), Some("Failed to create machine"));
    assert_eq!(
        ctl.form().map(|f| f.phase.clone()),
        Some(FormPhase::Failed("Failed to create machine".to_string()))
    );
}

#[tokio::test]
async fn non_numeric_multiplier_is_refused_before_sending() {
    let (api, sim) = start(machines()).await;
    let mut ctl = MachinesController::new(api);

    ctl.open_create();
    ctl.fields_mut().unwrap().multiplier = "lots".to_string();
    assert!(ctl.submit_form().await.is_err());
    assert_eq!(ctl.error(), Some("Multiplier must be a number"));
    assert_eq!(sim.count_requests("POST", "/admin/cnc/machines").await, 0);
}

#[tokio::test]
async fn delete_quotes_name_and_refetches() {
    let mut state = SimState::new();
    state.seed_material("Oak");
    state.seed_material("Baltic \"Birch\"");
    let (api, _sim) = start(state).await;
    let mut ctl = MaterialsController::new(api);
    ctl.load().await.unwrap();

    ctl.request_delete(2).unwrap();
    assert_eq!(
        ctl.confirmation().unwrap().message,
        "Are you sure you want to delete this material: \"Baltic \"Birch\"\"?"
    );
    ctl.confirm_delete().await.unwrap();
    assert_eq!(ctl.rows().len(), 1);
    assert_eq!(ctl.rows()[0].name, "Oak");
}

#[tokio::test]
async fn delete_failure_is_inline() {
    let mut state = SimState::new();
    state.seed_bit("Downcut", 0.25, 0.4);
    let (api, sim) = start(state).await;
    sim.with(|s| s.fail_next("DELETE", "/admin/cnc/bits/1", 500, "")).await;

    let mut ctl = BitsController::new(api);
    ctl.load().await.unwrap();
    ctl.request_delete(1).unwrap();
    assert!(ctl.confirm_delete().await.is_err());
    assert_eq!(ctl.error(), Some("Failed to delete bit"));
    assert!(ctl.confirmation().is_some());
    assert_eq!(ctl.rows().len(), 1);
}

#[tokio::test]
async fn load_failure_names_the_collection() {
    let (api, sim) = start(SimState::new()).await;
    sim.with(|s| s.fail_next("GET", "/admin/cnc/spindles", 503, "")).await;
    let mut ctl = SpindlesController::new(api);
    assert!(ctl.load().await.is_err());
    assert_eq!(ctl.error(), Some("Failed to load spindles (503)"));
}

#[tokio::test]
async fn picking_a_spindle_hands_its_scope_to_the_settings_screen() {
    let mut state = SimState::new();
    state.seed_spindle("Router A");
    let (api, _sim) = start(state).await;
    let mut ctl = SpindlesController::new(api);
    ctl.load().await.unwrap();

    let mut nav = Navigator::new();
    let scope = nav.select_spindle(ctl.row(1).unwrap());
    assert_eq!(scope.name, "Router A");
    assert_eq!(nav.route(), &Route::SpindleSettings(scope));
}

fn full_catalogue() -> SimState {
    let mut state = SimState::new();
    let spindle = state.seed_spindle("Router A");
    let bit = state.seed_bit("Downcut", 0.25, 0.4);
    let material = state.seed_material("Oak");
    state.seed_setting(10, &spindle, &bit, &material);
    state.seed_setting(12, &spindle, &bit, &material);
    state
}

#[tokio::test]
async fn settings_form_loads_all_four_lists() {
    let (api, _sim) = start(full_catalogue()).await;
    let mut ctl = SettingsController::new(api);
    ctl.load().await.unwrap();

    let ids: Vec<_> = ctl.rows().iter().map(|s| s.setting_id).collect();
    assert_eq!(ids, vec![12, 10]);
    assert_eq!(ctl.spindles().len(), 1);
    assert_eq!(ctl.bits().len(), 1);
    assert_eq!(ctl.materials().len(), 1);
}

#[tokio::test]
async fn settings_form_fails_whole_screen_on_first_error() {
    let (api, sim) = start(full_catalogue()).await;
    sim.with(|s| s.fail_next("GET", "/admin/cnc/bits", 500, "")).await;
    let mut ctl = SettingsController::new(api);

    assert!(ctl.load().await.is_err());
    assert_eq!(ctl.error(), Some("Failed to load bits (500)"));
    assert!(ctl.rows().is_empty());
    assert!(ctl.spindles().is_empty());
    assert!(ctl.materials().is_empty());
}

#[tokio::test]
async fn settings_create_requires_all_three_dropdowns() {
    let (api, sim) = start(full_catalogue()).await;
    let mut ctl = SettingsController::new(api);
    ctl.load().await.unwrap();

    ctl.open_create();
    {
        let form = ctl.form_mut().unwrap();
        form.fields.rpm = "18000".to_string();
        form.fields.feed = "100".to_string();
        form.fields.doc = "0.1".to_string();
        form.fields.stepover = "0.1".to_string();
        form.fields.plunge = "25".to_string();
        form.selection.spindle_id = Some(1);
        form.selection.bit_id = Some(2);
    }
    assert!(!ctl.can_submit());
    assert!(ctl.submit().await.is_err());
    assert_eq!(
        ctl.error(),
        Some("Please select Spindle, Material, and Bit before creating a setting")
    );
    assert_eq!(sim.count_requests("POST", "/admin/cnc/settings").await, 0);

    ctl.form_mut().unwrap().selection.material_id = Some(3);
    assert!(ctl.can_submit());
    ctl.submit().await.unwrap();
    assert_eq!(ctl.rows().len(), 3);
    assert_eq!(ctl.rows()[0].material_name, "Oak");
    assert_eq!(ctl.rows()[0].warning, None);
}

#[tokio::test]
async fn settings_edit_ignores_dropdowns() {
    let (api, _sim) = start(full_catalogue()).await;
    let mut ctl = SettingsController::new(api);
    ctl.load().await.unwrap();

    ctl.open_edit(10).unwrap();
    assert!(ctl.can_submit());
    {
        let form = ctl.form_mut().unwrap();
        form.selection = Default::default();
        form.fields.warning = "Clamp firmly".to_string();
    }
    assert!(ctl.can_submit());
    ctl.submit().await.unwrap();

    let edited = ctl.rows().iter().find(|s| s.setting_id == 10).unwrap();
    assert_eq!(edited.warning.as_deref(), Some("Clamp firmly"));
    assert_eq!(edited.spindle_id, 1);
}
