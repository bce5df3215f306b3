//! Integration tests for the working set and the renderer
//!
//! These tests cover the life of a visualised network:
//! - Toggling entities in and out of the working set
//! - Rendering the working set into link batches
//! - Deletion and refresh keeping the working set consistent

mod common;

use common::builders::PairBuilder;
use spikeviz_rs::config::AppConfig;
use spikeviz_rs::connectivity::{AlwaysRegenerate, ConnectivityPattern};
use spikeviz_rs::scene::{SceneRenderer, Viewport};
use spikeviz_rs::sync::ViewEvent;

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0)
}

#[test]
fn test_one_to_one_scene_draws_every_link() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let (mut ctl, rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);

    let entry = ctl.working_set().connection(ids.synapse).expect("connection resolved");
    assert_eq!(entry.links.len(), 20);
    assert!(entry.links.iter().all(|l| l.src == l.dst));
    assert!(rx.drain().contains(&ViewEvent::RedrawRequested));

    let mut renderer = SceneRenderer::new(&AppConfig::default());
    let frame = renderer.render(&ctl.scene_view(&model), viewport());

    assert_eq!(frame.populations.len(), 2);
    assert_eq!(frame.connections.len(), 1);
    assert_eq!(frame.connections[0].batch.polylines.len(), 20);
    assert_eq!(frame.stats.links, 20);
    assert_eq!(frame.stats.neurons, 40);
    assert_eq!(frame.stats.skipped_links, 0);
}

#[test]
fn test_unchanged_scene_reuses_batches() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::AllToAll).sizes(6, 5).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);

    let mut renderer = SceneRenderer::new(&AppConfig::default());
    let first = renderer.render(&ctl.scene_view(&model), viewport());
    assert_eq!(first.stats.rebuilt, 3);
    assert_eq!(first.stats.links, 30);

    let second = renderer.render(&ctl.scene_view(&model), viewport());
    assert_eq!(second.stats.rebuilt, 0);

    model.set_strength(ids.synapse, 2).expect("strength");
    ctl.connection_changed(&model, ids.synapse, &AlwaysRegenerate);
    let third = renderer.render(&ctl.scene_view(&model), viewport());
    assert_eq!(third.stats.rebuilt, 1);
}

#[test]
fn test_hiding_source_keeps_destination() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);

    ctl.set_visualised(&mut model, ids.a, false, &AlwaysRegenerate)
        .expect("toggle off");

    assert!(ctl.working_set().population(ids.a).is_none());
    let b = ctl.working_set().population(ids.b).expect("B still drawn");
    assert_eq!(b.layout.len(), 20);

    let mut renderer = SceneRenderer::new(&AppConfig::default());
    let frame = renderer.render(&ctl.scene_view(&model), viewport());
    assert_eq!(frame.populations.len(), 1);
    assert_eq!(frame.stats.neurons, 20);
}

#[test]
fn test_refresh_drops_deleted_connection() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);

    let changed = model.set_deleted(ids.synapse, true).expect("mark deleted");
    assert!(changed.contains(&ids.synapse));
    ctl.refresh_all(&model, &AlwaysRegenerate);

    assert!(ctl.working_set().connection(ids.synapse).is_none());
    assert!(ctl.working_set().population(ids.a).is_some());
    assert!(ctl.working_set().population(ids.b).is_some());

    // restoring brings it back on the next sync
    model.set_deleted(ids.synapse, false).expect("restore");
    ctl.sync_visibility(&model, &AlwaysRegenerate);
    assert_eq!(
        ctl.working_set().connection(ids.synapse).map(|c| c.links.len()),
        Some(20)
    );
}

#[test]
fn test_resized_population_is_refreshed() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);

    model.set_neuron_count(ids.b, 12).expect("resize");
    ctl.refresh_all(&model, &AlwaysRegenerate);

    assert_eq!(ctl.working_set().population(ids.b).map(|p| p.layout.len()), Some(12));
    // one-to-one no longer fits, so no partial list is kept
    assert_eq!(
        ctl.working_set().connection(ids.synapse).map(|c| c.links.len()),
        Some(0)
    );
    assert!(!ctl.diagnostics().is_empty());
}

#[test]
fn test_removed_population_takes_connections_along() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b, ids.synapse]);
    ctl.select(&model, Some(ids.synapse));

    let removed = model.remove(ids.a);
    assert!(removed.contains(&ids.a));
    assert!(removed.contains(&ids.projection));
    assert!(removed.contains(&ids.synapse));
    ctl.on_deleted(&model, &removed);

    assert!(!model.is_valid(ids.a));
    assert!(ctl.working_set().population(ids.a).is_none());
    assert!(ctl.working_set().connection(ids.synapse).is_none());
    assert_eq!(ctl.selected(), None);
    assert_eq!(ctl.working_set().populations().len(), 1);
}

#[test]
fn test_pick_finds_drawn_neuron() {
    let (mut model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).sizes(4, 4).build();
    let (mut ctl, _rx) = common::controller();
    common::visualise_all(&mut model, &mut ctl, &[ids.a, ids.b]);

    let mut renderer = SceneRenderer::new(&AppConfig::default());
    let frame = renderer.render(&ctl.scene_view(&model), viewport());
    let draw = frame
        .populations
        .iter()
        .find(|d| d.id == ids.b)
        .expect("B is drawn");
    let glyph = draw.batch.glyphs[0];
    let (screen, _) = frame.project(draw.translation + glyph.position).expect("on screen");

    let hit = renderer.pick(&frame, screen).expect("neuron under cursor");
    assert_eq!(hit.population, ids.b);
    assert!(hit.neuron < 4);

    // far outside every glyph
    assert_eq!(renderer.pick(&frame, screen + glam::Vec2::new(5000.0, 5000.0)), None);
}
