// Library exports for the OnlyCNCs admin API simulator

pub mod server;
pub mod store;

pub use server::{router, serve, spawn, Sim};
pub use store::{RecordedRequest, SimResource, SimState, StoreError, Submission};

/// A small catalogue for local development: two spindles, a handful of
/// bits and materials, settings on the first spindle, one admin.
pub fn demo_state() -> SimState {
    let mut state = SimState::new();
    state.seed_machine("Shapeoko 4", 1.0);
    state.seed_machine("X-Carve Pro", 0.9);
    let router_a = state.seed_spindle("Router A");
    state.seed_spindle("Spindle 2.2kW");
    let downcut = state.seed_bit("1/4 Downcut", 0.25, 0.4);
    let vbit = state.seed_bit("60deg V-bit", 0.5, 0.1);
    let oak = state.seed_material("Oak");
    let mdf = state.seed_material("MDF");
    state.seed_setting(100, &router_a, &downcut, &oak);
    state.seed_setting(101, &router_a, &vbit, &mdf);
    state.seed_user("Ops Admin", "ops@onlycncs.com", true);
    state.seed_user("Maker Jo", "jo@example.com", false);
    state
}
