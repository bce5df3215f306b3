//! Frame construction
//!
//! [`SceneRenderer::render`] turns the controller's working set into a
//! [`Frame`]: camera matrices, one cached glyph batch per visualised
//! population, one cached line batch per visualised connection, and a
//! per-frame overlay with the highlighted links of the selected
//! connection drawn on top. The UI paints the frame; the renderer never
//! touches a graphics API.
//!
//! Repaints go through a [`RepaintLimiter`] so bursts of change
//! notifications collapse into at most one frame per interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec2, Vec3};

use crate::config::{AppConfig, RuntimeSettings};
use crate::geometry::bezier::sample_bezier;
use crate::model::{Entity, EntityId, NetworkModel};
use crate::scene::batch::{BatchCache, BatchStamp, ConnectionBatch, Glyph, Polyline, PopulationBatch};
use crate::scene::camera::{project, projected_radius, Camera, ViewMode, Viewport, SCENE_OFFSET};
use crate::scene::lod::{glyph_outline, level_of_detail};
use crate::scene::picking::{decode_pick, encode_pick, PickBuffer};
use crate::scene::style::{classify_link, metric_range, metric_style, pattern_style};
use crate::sync::{ConnectionEntry, PopulationEntry, WorkingSet};
use crate::types::{Bounds3, Link, Rgba};

/// Radius of a neuron glyph in scene units
pub const GLYPH_RADIUS: f32 = 0.5;

/// Points sampled along a bent link
pub const BENT_LINK_SAMPLES: usize = 31;

/// Background outside image export
pub const BACKGROUND: Rgba = Rgba::new(0.75, 0.75, 0.75, 1.0);

/// Half-size of the pick window around the cursor, in pixels
const PICK_WINDOW: usize = 4;

// ==================== Repaint limiting ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    /// A request arrived too soon after the last frame and is waiting
    RateLimited,
    Rendering,
}

/// Coalesces redraw requests to at most one frame per interval
#[derive(Debug, Clone)]
pub struct RepaintLimiter {
    min_interval: Duration,
    last_render: Option<Instant>,
    state: RenderState,
    pending: bool,
    coalesced: u64,
}

impl RepaintLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_render: None,
            state: RenderState::Idle,
            pending: false,
            coalesced: 0,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Requests absorbed into an earlier or later frame
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Ask for a frame, returns whether rendering may start now.
    ///
    /// A refused request is remembered (once) and granted by a later
    /// [`poll`](Self::poll).
    pub fn request(&mut self, now: Instant) -> bool {
        if self.state == RenderState::Rendering {
            self.defer();
            return false;
        }
        if let Some(last) = self.last_render {
            if now.saturating_duration_since(last) < self.min_interval {
                tracing::trace!("Redraw rate limited");
                self.state = RenderState::RateLimited;
                self.defer();
                return false;
            }
        }
        self.state = RenderState::Rendering;
        self.pending = false;
        true
    }

    fn defer(&mut self) {
        if self.pending {
            self.coalesced += 1;
        }
        self.pending = true;
    }

    /// Mark the frame started by [`request`](Self::request) as done
    pub fn finish(&mut self, now: Instant) {
        self.last_render = Some(now);
        self.state = if self.pending {
            RenderState::RateLimited
        } else {
            RenderState::Idle
        };
    }

    /// Start a deferred frame once the interval has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.pending || self.state == RenderState::Rendering || !self.interval_elapsed(now) {
            return false;
        }
        self.state = RenderState::Rendering;
        self.pending = false;
        true
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        self.last_render
            .map(|last| now.saturating_duration_since(last) >= self.min_interval)
            .unwrap_or(true)
    }

    /// Time until a deferred frame may start, `None` when nothing waits
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        if !self.pending {
            return None;
        }
        let ready = self.last_render.map(|l| l + self.min_interval).unwrap_or(now);
        Some(ready.saturating_duration_since(now))
    }
}

// ==================== Frame ====================

/// Read-only input of one frame
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub model: &'a NetworkModel,
    pub working: &'a WorkingSet,
    pub selected: Option<EntityId>,
    pub settings: &'a RuntimeSettings,
}

#[derive(Debug, Clone)]
pub struct PopulationDraw {
    pub id: EntityId,
    /// Scene translation of the batch's glyphs
    pub translation: Vec3,
    pub batch: Arc<PopulationBatch>,
}

#[derive(Debug, Clone)]
pub struct ConnectionDraw {
    pub id: EntityId,
    pub batch: Arc<ConnectionBatch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub neurons: usize,
    pub links: usize,
    pub skipped_links: usize,
    /// Batches built for this frame
    pub rebuilt: u64,
}

/// Everything the UI needs to paint one frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub viewport: Viewport,
    pub clear: Rgba,
    pub lod: u32,
    pub line_scale: f32,
    pub glyph_radius: f32,
    /// True when the frame shows a layout preview instead of the scene
    pub preview: bool,
    pub populations: Vec<PopulationDraw>,
    pub connections: Vec<ConnectionDraw>,
    /// Highlighted links, drawn after everything else
    pub overlay: Vec<Polyline>,
    pub stats: FrameStats,
}

impl Frame {
    /// Pixel position and depth of a scene point
    pub fn project(&self, point: Vec3) -> Option<(Vec2, f32)> {
        project(self.view_proj, point, self.viewport)
    }

    /// On-screen radius of a glyph centred at `point`
    pub fn glyph_screen_radius(&self, point: Vec3) -> Option<f32> {
        projected_radius(self.view, self.view_proj, point, self.glyph_radius, self.viewport)
    }
}

/// Neuron under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickHit {
    pub population: EntityId,
    pub neuron: usize,
}

// ==================== Renderer ====================

pub struct SceneRenderer {
    pub camera: Camera,
    limiter: RepaintLimiter,
    cache: BatchCache,
    quality: u32,
}

impl SceneRenderer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            camera: Camera::new(config.camera.clone()),
            limiter: RepaintLimiter::new(config.render.min_repaint_interval()),
            cache: BatchCache::new(),
            quality: config.render.detail_quality,
        }
    }

    pub fn limiter(&self) -> &RepaintLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut RepaintLimiter {
        &mut self.limiter
    }

    pub fn cache(&self) -> &BatchCache {
        &self.cache
    }

    pub fn set_quality(&mut self, quality: u32) {
        self.quality = quality;
    }

    /// Drop every cached batch
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Build a frame from the current working set
    pub fn render(&mut self, view: &SceneView<'_>, viewport: Viewport) -> Frame {
        let settings = view.settings;
        let export = settings.is_exporting();
        let line_scale = settings.line_scale();
        let clear = if export { Rgba::TRANSPARENT_WHITE } else { BACKGROUND };
        let rebuilds_before = self.cache.rebuilds();

        if let Some(preview) = settings.layout_preview.as_ref().filter(|p| !p.is_empty()) {
            return self.render_preview(preview, view.selected, viewport, clear, line_scale, export);
        }

        let working = view.working;
        self.cache.retain(|id| working.contains(id));

        let total = working.total_neurons();
        let lod = level_of_detail(total, self.quality, export);
        let offset_bits = BatchStamp::offset_bits(settings.preview_offset);

        let mut populations = Vec::with_capacity(working.populations().len());
        for (index, entry) in working.populations().iter().enumerate() {
            let Some(pop) = view.model.population(entry.id) else {
                continue;
            };
            let stamp = BatchStamp {
                entity: pop.generation,
                working: entry.revision,
                lod,
                export,
                ..Default::default()
            };
            let base = default_colour(pop.colour);
            let batch = self
                .cache
                .population(entry.id, stamp, || build_population(entry, index, base, lod));
            populations.push(PopulationDraw {
                id: entry.id,
                translation: scene_position(view, entry.id),
                batch,
            });
        }

        let mut connections = Vec::with_capacity(working.connections().len());
        let mut overlay = Vec::new();
        let mut stats = FrameStats {
            neurons: total,
            ..Default::default()
        };
        for entry in working.connections() {
            let src_drawn = working.population(entry.src);
            let dst_drawn = working.population(entry.dst);
            if src_drawn.is_none() && dst_drawn.is_none() {
                continue;
            }
            let Some(entity) = view.model.entity(entry.id) else {
                continue;
            };
            let generation = |id| view.model.generation(id).unwrap_or(0);
            let touches_selected = view.selected.map(|s| entry.touches(s)).unwrap_or(false);
            let stamp = BatchStamp {
                entity: generation(entry.id),
                working: entry.revision,
                src: generation(entry.src) ^ src_drawn.map(|e| e.revision).unwrap_or(0),
                dst: generation(entry.dst) ^ dst_drawn.map(|e| e.revision).unwrap_or(0),
                lod: 0,
                export,
                offset: if touches_selected { offset_bits } else { [0; 3] },
            };
            let ends = LinkEnds {
                src: src_drawn.map(|e| e.layout.as_slice()),
                dst: dst_drawn.map(|e| e.layout.as_slice()),
                src_origin: scene_position(view, entry.src),
                dst_origin: scene_position(view, entry.dst),
            };
            let batch = self
                .cache
                .connection(entry.id, stamp, || build_connection(entity, entry, &ends, line_scale));
            stats.links += batch.polylines.len();
            stats.skipped_links += entry.skipped;

            if view.selected == Some(entry.id) {
                overlay.extend(highlight_overlay(entry, &batch, settings, line_scale));
            }
            connections.push(ConnectionDraw { id: entry.id, batch });
        }

        let mode = focus_bounds(view)
            .map(ViewMode::Focus)
            .unwrap_or(ViewMode::Default);
        let visible = visible_bounds(&populations);
        let view_m = self.camera.view(mode);
        let projection = self.camera.projection(viewport, visible);
        stats.rebuilt = self.cache.rebuilds() - rebuilds_before;

        Frame {
            view: view_m,
            projection,
            view_proj: projection * view_m,
            viewport,
            clear,
            lod,
            line_scale,
            glyph_radius: GLYPH_RADIUS,
            preview: false,
            populations,
            connections,
            overlay,
            stats,
        }
    }

    fn render_preview(
        &mut self,
        positions: &[Vec3],
        selected: Option<EntityId>,
        viewport: Viewport,
        clear: Rgba,
        line_scale: f32,
        export: bool,
    ) -> Frame {
        let lod = level_of_detail(positions.len(), self.quality, export);
        let batch = PopulationBatch {
            glyphs: positions
                .iter()
                .map(|p| Glyph {
                    position: *p,
                    colour: Rgba::PREVIEW_GREY,
                    pick: None,
                })
                .collect(),
            outline: glyph_outline(lod),
        };
        let bounds = Bounds3::from_points(positions);
        let view_m = bounds
            .map(|b| self.camera.view(ViewMode::Preview(b)))
            .unwrap_or_else(|| self.camera.view(ViewMode::Default));
        let projection = self.camera.projection(viewport, bounds);
        Frame {
            view: view_m,
            projection,
            view_proj: projection * view_m,
            viewport,
            clear,
            lod,
            line_scale,
            glyph_radius: GLYPH_RADIUS,
            preview: true,
            populations: vec![PopulationDraw {
                id: selected.unwrap_or(EntityId::INVALID),
                translation: Vec3::ZERO,
                batch: Arc::new(batch),
            }],
            connections: Vec::new(),
            overlay: Vec::new(),
            stats: FrameStats {
                neurons: positions.len(),
                ..Default::default()
            },
        }
    }

    /// Identify the neuron under `cursor` (pixels, y down).
    ///
    /// Glyphs near the cursor are rasterised into a small colour-coded
    /// buffer and the pixel under the cursor is decoded. Background and
    /// anything that fails to decode is no hit.
    pub fn pick(&self, frame: &Frame, cursor: Vec2) -> Option<PickHit> {
        if frame.preview || !cursor.is_finite() {
            return None;
        }
        let size = PICK_WINDOW * 2 + 1;
        let origin = cursor.floor() - Vec2::splat(PICK_WINDOW as f32);
        let mut buffer = PickBuffer::new(size, size);
        let reach = size as f32;
        let mut counts = Vec::with_capacity(frame.populations.len());

        for draw in &frame.populations {
            counts.push(draw.batch.glyphs.len());
            for glyph in &draw.batch.glyphs {
                let Some(pick) = glyph.pick else {
                    continue;
                };
                let world = draw.translation + glyph.position;
                let Some((screen, depth)) = frame.project(world) else {
                    continue;
                };
                let Some(radius) = frame.glyph_screen_radius(world) else {
                    continue;
                };
                if (screen - cursor).abs().max_element() > radius + reach {
                    continue;
                }
                buffer.fill_disc(screen - origin, radius, depth, pick);
            }
        }

        let local = cursor - origin;
        let index = decode_pick(buffer.read(local.x, local.y), &counts)?;
        let draw = frame.populations.get(index.population)?;
        Some(PickHit {
            population: draw.id,
            neuron: index.neuron,
        })
    }
}

// ==================== Batch builders ====================

/// Glyph colour of a population without a log overlay
pub fn default_colour(colour: [u8; 3]) -> Rgba {
    let lift = |c: u8| (100.0 + 0.5 * c as f32).min(255.0) as u8;
    Rgba::from_rgb8(lift(colour[0]), lift(colour[1]), lift(colour[2]))
}

fn build_population(entry: &PopulationEntry, index: usize, base: Rgba, lod: u32) -> PopulationBatch {
    let colours = entry
        .colours
        .as_ref()
        .filter(|c| c.len() == entry.layout.len());
    PopulationBatch {
        glyphs: entry
            .layout
            .iter()
            .enumerate()
            .map(|(i, p)| Glyph {
                position: *p,
                colour: colours.map(|c| c[i]).unwrap_or(base),
                pick: encode_pick(index, i),
            })
            .collect(),
        outline: glyph_outline(lod),
    }
}

/// Layouts of the drawn endpoints and where each endpoint sits
struct LinkEnds<'a> {
    src: Option<&'a [Vec3]>,
    dst: Option<&'a [Vec3]>,
    src_origin: Vec3,
    dst_origin: Vec3,
}

impl LinkEnds<'_> {
    /// Scene points of a link; an endpoint that is not drawn collapses
    /// to its population's position
    fn points(&self, link: &Link) -> Option<(Vec3, Vec3)> {
        let end = |layout: Option<&[Vec3]>, index: u32, origin: Vec3| match layout {
            Some(l) => l.get(index as usize).map(|p| origin + *p),
            None => Some(origin),
        };
        Some((
            end(self.src, link.src, self.src_origin)?,
            end(self.dst, link.dst, self.dst_origin)?,
        ))
    }
}

fn build_connection(entity: &Entity, entry: &ConnectionEntry, ends: &LinkEnds<'_>, line_scale: f32) -> ConnectionBatch {
    let (pattern, strength, center, by_metric) = match entity {
        Entity::Synapse(s) => (&s.pattern, s.strength, s.center, s.colour_by_metric),
        Entity::GenericInput(g) => (&g.pattern, g.strength, g.center, g.colour_by_metric),
        _ => return ConnectionBatch::default(),
    };
    let explicit = pattern.explicit().is_some();
    let base = pattern_style(pattern).scaled(line_scale);
    let range = if explicit && by_metric {
        metric_range(&entry.links)
    } else {
        None
    };
    let center = center + SCENE_OFFSET;

    let polylines = entry
        .links
        .iter()
        .filter_map(|link| {
            let (a, b) = ends.points(link)?;
            let points = if explicit && strength > 0 {
                let mut control = Vec::with_capacity(strength as usize + 2);
                control.push(a);
                control.extend(std::iter::repeat(center).take(strength as usize));
                control.push(b);
                sample_bezier(&control, BENT_LINK_SAMPLES - 1)
            } else {
                vec![a, b]
            };
            let style = if explicit && by_metric {
                metric_style(link.metric, range).scaled(line_scale)
            } else {
                base
            };
            Some(Polyline {
                points,
                colour: style.colour,
                width: style.width,
            })
        })
        .collect();
    ConnectionBatch { polylines }
}

fn highlight_overlay(
    entry: &ConnectionEntry,
    batch: &ConnectionBatch,
    settings: &RuntimeSettings,
    line_scale: f32,
) -> Vec<Polyline> {
    if settings.table_selection.is_empty() && settings.neuron_focus.is_none() {
        return Vec::new();
    }
    // batch polylines line up with links only when none were dropped
    if batch.polylines.len() != entry.links.len() {
        return Vec::new();
    }
    let mut tiers: Vec<_> = (0..entry.links.len())
        .filter_map(|i| {
            let tier = classify_link(i, &entry.links, &settings.table_selection, settings.neuron_focus);
            tier.style().map(|style| (tier, i, style.scaled(line_scale)))
        })
        .collect();
    // strongest tier last so it paints over the others
    tiers.sort_by_key(|(tier, i, _)| (*tier, *i));
    tiers
        .into_iter()
        .map(|(_, i, style)| Polyline {
            points: batch.polylines[i].points.clone(),
            colour: style.colour,
            width: style.width,
        })
        .collect()
}

/// Scene position of a population, honouring the uncommitted preview
/// position of the selected one
fn scene_position(view: &SceneView<'_>, id: EntityId) -> Vec3 {
    let position = match (view.selected, view.settings.preview_offset) {
        (Some(selected), Some(offset)) if selected == id => offset,
        _ => view.model.population(id).map(|p| p.position).unwrap_or(Vec3::ZERO),
    };
    SCENE_OFFSET + position
}

/// Layout bounds of the selected visualised population, else the first
fn focus_bounds(view: &SceneView<'_>) -> Option<Bounds3> {
    let working = view.working;
    let entry = view
        .selected
        .and_then(|id| working.population(id))
        .or_else(|| working.populations().first())?;
    Some(entry.bounds()?.translated(scene_position(view, entry.id)))
}

fn visible_bounds(populations: &[PopulationDraw]) -> Option<Bounds3> {
    populations
        .iter()
        .filter_map(|d| {
            Bounds3::from_points(d.batch.glyphs.iter().map(|g| &g.position)).map(|b| b.translated(d.translation))
        })
        .reduce(Bounds3::union)
}
