//! Externally generated connection lists
//!
//! Explicit connectivity comes from a [`ConnectionGenerator`]: an imported
//! list, a distance kernel or a script. The generated list and the
//! generator's "changed" flag live together behind one mutex in
//! [`GeneratedConnections`], shared between the UI thread and the
//! background generation worker.
//!
//! Locking rule: hold the lock only to read or write the list and flag, or
//! to run a regeneration. Never hold it while waiting on the user.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpikeVizError};
use crate::types::Link;

/// Kind of generator behind an explicit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// Imported or hand-edited list
    List,
    /// Distance kernel over the two layouts
    Kernel,
    /// Rhai script
    Script,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::List => write!(f, "list"),
            GeneratorKind::Kernel => write!(f, "kernel"),
            GeneratorKind::Script => write!(f, "script"),
        }
    }
}

/// Source of an explicit link list
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionGenerator: Send {
    fn kind(&self) -> GeneratorKind;

    /// True when the stored list no longer reflects the generator's inputs
    fn changed(&self) -> bool;

    /// Produce a fresh list for layouts of the given positions
    fn regenerate(&mut self, src_layout: &[Vec3], dst_layout: &[Vec3]) -> Result<Vec<Link>>;

    /// Clear the changed flag after a successful regeneration
    fn set_unchanged(&mut self);

    /// Flag the list stale because an input outside the generator changed
    fn mark_changed(&mut self);

    /// Opaque generator parameters persisted with the edge metadata
    fn metadata(&self) -> serde_json::Value;
}

// ==================== Shared state ====================

/// Generated list plus the generator that owns its staleness
pub struct GeneratedConnections {
    generator: Box<dyn ConnectionGenerator>,
    links: Vec<Link>,
    version: u64,
}

impl GeneratedConnections {
    pub fn new(generator: Box<dyn ConnectionGenerator>) -> Self {
        Self {
            generator,
            links: Vec::new(),
            version: 0,
        }
    }

    /// Start from a list that is already current
    pub fn with_links(mut generator: Box<dyn ConnectionGenerator>, links: Vec<Link>) -> Self {
        generator.set_unchanged();
        Self {
            generator,
            links,
            version: 1,
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Bumped on every successful regeneration
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_stale(&self) -> bool {
        self.generator.changed()
    }

    pub fn kind(&self) -> GeneratorKind {
        self.generator.kind()
    }

    pub fn metadata(&self) -> serde_json::Value {
        self.generator.metadata()
    }

    pub fn generator_mut(&mut self) -> &mut dyn ConnectionGenerator {
        self.generator.as_mut()
    }

    /// Regenerate if stale. Returns true when the list was replaced.
    ///
    /// On failure the previous list is kept and the changed flag stays set.
    pub fn regenerate_if_stale(&mut self, src_layout: &[Vec3], dst_layout: &[Vec3]) -> Result<bool> {
        if !self.generator.changed() {
            return Ok(false);
        }
        let links = self.generator.regenerate(src_layout, dst_layout)?;
        self.generator.set_unchanged();
        self.links = links;
        self.version += 1;
        Ok(true)
    }
}

/// Thread-safe handle to a generated connection list
#[derive(Clone)]
pub struct ExplicitConnections {
    shared: Arc<Mutex<GeneratedConnections>>,
}

impl ExplicitConnections {
    pub fn new(generator: impl ConnectionGenerator + 'static) -> Self {
        Self::from_boxed(Box::new(generator))
    }

    pub fn from_boxed(generator: Box<dyn ConnectionGenerator>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(GeneratedConnections::new(generator))),
        }
    }

    /// Fixed list that is never stale
    pub fn from_links(links: Vec<Link>) -> Self {
        let generator = Box::new(ListGenerator::from_links(&links));
        Self {
            shared: Arc::new(Mutex::new(GeneratedConnections::with_links(generator, links))),
        }
    }

    /// Enter the exclusive section.
    ///
    /// A panic inside a previous holder does not invalidate the list, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, GeneratedConnections> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_stale(&self) -> bool {
        self.lock().is_stale()
    }

    /// Force regeneration on the next resolution
    pub fn mark_changed(&self) {
        self.lock().generator_mut().mark_changed();
    }

    pub fn kind(&self) -> GeneratorKind {
        self.lock().kind()
    }

    /// Copy of the current list and its version
    pub fn snapshot(&self) -> (Vec<Link>, u64) {
        let guard = self.lock();
        (guard.links().to_vec(), guard.version())
    }

    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    pub fn metadata(&self) -> serde_json::Value {
        self.lock().metadata()
    }

    /// Both handles refer to the same shared list
    pub fn same_list(&self, other: &ExplicitConnections) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for ExplicitConnections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.try_lock() {
            Ok(guard) => f
                .debug_struct("ExplicitConnections")
                .field("kind", &guard.kind())
                .field("links", &guard.links().len())
                .field("version", &guard.version())
                .finish(),
            Err(_) => f.write_str("ExplicitConnections(<locked>)"),
        }
    }
}

// ==================== List generator ====================

/// Explicit list from text lines of `src,dst[,metric]`
#[derive(Debug, Clone, Default)]
pub struct ListGenerator {
    text: String,
    changed: bool,
}

impl ListGenerator {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            changed: true,
        }
    }

    pub fn from_links(links: &[Link]) -> Self {
        let text = links
            .iter()
            .map(|l| format!("{},{},{}", l.src, l.dst, l.metric))
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_text(text)
    }

    /// Replace the list text and mark it for regeneration
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.changed = true;
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parse `src,dst[,metric]` lines. Blank lines and `#` comments are ignored.
pub fn parse_link_list(text: &str) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(SpikeVizError::Generator(format!(
                "line {}: expected 'src,dst[,metric]', got '{}'",
                line_no + 1,
                line
            )));
        }
        let parse_index = |s: &str| {
            s.parse::<u32>().map_err(|e| {
                SpikeVizError::Generator(format!("line {}: bad index '{}': {}", line_no + 1, s, e))
            })
        };
        let src = parse_index(fields[0])?;
        let dst = parse_index(fields[1])?;
        let metric = match fields.get(2) {
            Some(m) => m.parse::<f32>().map_err(|e| {
                SpikeVizError::Generator(format!("line {}: bad metric '{}': {}", line_no + 1, m, e))
            })?,
            None => 0.0,
        };
        links.push(Link::with_metric(src, dst, metric));
    }
    Ok(links)
}

impl ConnectionGenerator for ListGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::List
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn regenerate(&mut self, _src_layout: &[Vec3], _dst_layout: &[Vec3]) -> Result<Vec<Link>> {
        parse_link_list(&self.text)
    }

    fn set_unchanged(&mut self) {
        self.changed = false;
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "type": "list", "text": self.text })
    }
}

// ==================== Kernel generator ====================

/// Gaussian distance kernel parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelParams {
    /// Standard deviation of the kernel in layout units
    pub sigma: f32,
    /// Peak weight at zero distance
    pub scale: f32,
    /// Pairs with a weight below this are not connected
    pub threshold: f32,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            scale: 1.0,
            threshold: 0.1,
        }
    }
}

/// Connects every pair whose kernel weight reaches the threshold
#[derive(Debug, Clone)]
pub struct KernelGenerator {
    params: KernelParams,
    changed: bool,
}

impl KernelGenerator {
    pub fn new(params: KernelParams) -> Self {
        Self {
            params,
            changed: true,
        }
    }

    pub fn params(&self) -> KernelParams {
        self.params
    }

    pub fn set_params(&mut self, params: KernelParams) {
        if params != self.params {
            self.params = params;
            self.changed = true;
        }
    }

    /// Weight for two neuron positions
    pub fn weight(&self, a: Vec3, b: Vec3) -> f32 {
        let sigma = self.params.sigma.max(f32::EPSILON);
        self.params.scale * (-(a.distance_squared(b)) / (2.0 * sigma * sigma)).exp()
    }
}

impl ConnectionGenerator for KernelGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Kernel
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn regenerate(&mut self, src_layout: &[Vec3], dst_layout: &[Vec3]) -> Result<Vec<Link>> {
        if !self.params.sigma.is_finite() || self.params.sigma <= 0.0 {
            return Err(SpikeVizError::Generator(format!(
                "kernel sigma must be positive, got {}",
                self.params.sigma
            )));
        }
        let mut links = Vec::new();
        for (i, a) in src_layout.iter().enumerate() {
            for (j, b) in dst_layout.iter().enumerate() {
                let w = self.weight(*a, *b);
                if w >= self.params.threshold {
                    links.push(Link::with_metric(i as u32, j as u32, w));
                }
            }
        }
        tracing::debug!(
            "Kernel generated {} links for {}x{} neurons",
            links.len(),
            src_layout.len(),
            dst_layout.len()
        );
        Ok(links)
    }

    fn set_unchanged(&mut self) {
        self.changed = false;
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "type": "kernel", "params": self.params })
    }
}

// ==================== Restoring ====================

/// Rebuild a generator from the metadata it persisted.
///
/// The restored generator starts out changed, so the first resolution
/// regenerates the list against the current layouts.
pub fn generator_from_metadata(meta: &serde_json::Value) -> Result<Box<dyn ConnectionGenerator>> {
    let kind = meta
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| SpikeVizError::Metadata("generator metadata has no type".to_string()))?;
    match kind {
        "list" => {
            let text = meta.get("text").and_then(serde_json::Value::as_str).unwrap_or_default();
            Ok(Box::new(ListGenerator::from_text(text)))
        }
        "kernel" => {
            let params: KernelParams = match meta.get("params") {
                Some(p) => serde_json::from_value(p.clone())
                    .map_err(|e| SpikeVizError::Metadata(format!("bad kernel params: {}", e)))?,
                None => KernelParams::default(),
            };
            Ok(Box::new(KernelGenerator::new(params)))
        }
        "script" => {
            let source = meta.get("source").and_then(serde_json::Value::as_str).unwrap_or_default();
            let seed = meta.get("seed").and_then(serde_json::Value::as_u64).unwrap_or(0);
            Ok(Box::new(crate::connectivity::ScriptGenerator::new(source, seed)?))
        }
        other => Err(SpikeVizError::Metadata(format!("unknown generator type '{}'", other))),
    }
}
