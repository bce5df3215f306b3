//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use glam::Vec2;
use spikeviz_rs::connectivity::AlwaysRegenerate;
use spikeviz_rs::model::{EntityId, NetworkModel};
use spikeviz_rs::sync::{view_channel, SelectionController, ViewEventReceiver};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert two points are approximately equal
pub fn assert_vec2_eq(a: Vec2, b: Vec2, epsilon: f32) {
    assert!(
        a.distance(b) < epsilon,
        "Expected {:?} to be approximately equal to {:?} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Controller wired to a fresh event channel
pub fn controller() -> (SelectionController, ViewEventReceiver) {
    let (tx, rx) = view_channel();
    (SelectionController::new(tx), rx)
}

/// Toggle every id on, panicking on failure
pub fn visualise_all(model: &mut NetworkModel, ctl: &mut SelectionController, ids: &[EntityId]) {
    for id in ids {
        ctl.set_visualised(model, *id, true, &AlwaysRegenerate)
            .unwrap_or_else(|e| panic!("failed to visualise {}: {}", id, e));
    }
}
