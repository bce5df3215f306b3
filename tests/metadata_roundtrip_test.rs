//! Integration tests for edge metadata persistence

mod common;

use common::builders::PairBuilder;
use common::assert_vec2_eq;
use glam::Vec2;
use spikeviz_rs::connectivity::{ConnectivityPattern, ExplicitConnections, KernelGenerator, KernelParams};
use spikeviz_rs::curves::{ControlPoint, MetaDocument};
use spikeviz_rs::Severity;

fn kernel(sigma: f32) -> ConnectivityPattern {
    ConnectivityPattern::Explicit(ExplicitConnections::new(KernelGenerator::new(KernelParams {
        sigma,
        scale: 1.0,
        threshold: 0.2,
    })))
}

#[test]
fn test_edited_geometry_survives_reload() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    model
        .move_control_point(ids.projection, ControlPoint::C1(0), Vec2::new(3.0, 5.0))
        .expect("move control point");
    let edited = model.edge_path(ids.projection).expect("path").control_points();

    let json = model.write_metadata().to_json().expect("serialise");
    let mut doc = MetaDocument::from_json(&json).expect("parse");

    let (mut fresh, fresh_ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let before = fresh.edge_path(fresh_ids.projection).expect("path").control_points();
    assert_ne!(before, edited);

    let diags = fresh.apply_metadata(&mut doc);
    assert!(diags.is_empty());
    assert_eq!(doc.remaining(), 0);

    let restored = fresh.edge_path(fresh_ids.projection).expect("path").control_points();
    assert_eq!(restored.len(), edited.len());
    for ((cp_a, a), (cp_b, b)) in restored.iter().zip(edited.iter()) {
        assert_eq!(cp_a, cp_b);
        assert_vec2_eq(*a, *b, 1e-4);
    }
}

#[test]
fn test_generator_parameters_are_restored() {
    let (model, _) = PairBuilder::new(kernel(2.5)).build();
    let mut doc = model.write_metadata();

    let (mut fresh, ids) = PairBuilder::new(kernel(0.7)).build();
    let diags = fresh.apply_metadata(&mut doc);
    assert!(diags.is_empty());

    let pattern = &fresh.synapse(ids.synapse).expect("synapse").pattern;
    assert_eq!(pattern.metadata()["params"]["sigma"].as_f64(), Some(2.5));
    // a rebuilt generator has not produced its list yet
    assert!(pattern.explicit().map(|e| e.is_stale()).unwrap_or(false));
}

#[test]
fn test_unmatched_records_are_reported() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    model
        .move_control_point(ids.projection, ControlPoint::C2(0), Vec2::new(-2.0, 4.0))
        .expect("move control point");
    let mut doc = model.write_metadata();

    // same shape, different names: nothing matches
    let mut other = spikeviz_rs::NetworkModel::new();
    let x = other.add_population("X", 20, Vec2::ZERO);
    let y = other.add_population("Y", 20, Vec2::new(6.0, 0.0));
    let proj = other.add_projection("X to Y", x, y).expect("projection");
    let default_path = other.edge_path(proj).expect("path").clone();

    let diags = other.apply_metadata(&mut doc);
    assert_eq!(doc.remaining(), 1);
    assert_eq!(diags.entries().len(), 1);
    assert_eq!(diags.entries()[0].severity, Severity::Info);
    assert_eq!(other.edge_path(proj), Some(&default_path));
}

#[test]
fn test_metadata_file_roundtrip() {
    let (model, _) = PairBuilder::new(ConnectivityPattern::AllToAll).build();
    let doc = model.write_metadata();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("edges.json");
    doc.save(&path).expect("save");
    let loaded = MetaDocument::load(&path).expect("load");

    assert_eq!(loaded.remaining(), doc.remaining());
    assert_eq!(loaded.to_json().expect("json"), doc.to_json().expect("json"));

    assert!(MetaDocument::load(&dir.path().join("missing.json")).is_err());
}
