//! Rhai-scripted connection generator
//!
//! A script returns an array of links, each an array `[src, dst]` or
//! `[src, dst, metric]`. The layouts being connected are visible to the
//! script through registered functions:
//!
//! - `src_count()` / `dst_count()` - neuron counts
//! - `src_pos(i)` / `dst_pos(j)` - neuron position as `[x, y, z]`
//! - `distance(i, j)` - distance between source `i` and destination `j`
//! - `rand()` - uniform number in `[0, 1)` from the script's seed
//!
//! ```rhai
//! let links = [];
//! for i in 0..src_count() {
//!     for j in 0..dst_count() {
//!         if distance(i, j) < 2.0 { links.push([i, j, distance(i, j)]); }
//!     }
//! }
//! links
//! ```

use std::sync::{Arc, RwLock};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rhai::{Array, Dynamic, Engine, Scope, AST};

use crate::connectivity::generator::{ConnectionGenerator, GeneratorKind};
use crate::error::{Result, ResultExt, SpikeVizError};
use crate::types::Link;

/// Layout data visible to the running script
#[derive(Debug)]
struct ScriptLayouts {
    src: Vec<Vec3>,
    dst: Vec<Vec3>,
    rng: StdRng,
}

impl Default for ScriptLayouts {
    fn default() -> Self {
        Self {
            src: Vec::new(),
            dst: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }
}

type SharedLayouts = Arc<RwLock<ScriptLayouts>>;

fn pos_array(p: Vec3) -> Array {
    vec![
        Dynamic::from_float(p.x as f64),
        Dynamic::from_float(p.y as f64),
        Dynamic::from_float(p.z as f64),
    ]
}

/// Generator that runs a Rhai script to produce its links
pub struct ScriptGenerator {
    engine: Engine,
    source: String,
    ast: Option<AST>,
    seed: u64,
    layouts: SharedLayouts,
    changed: bool,
}

impl ScriptGenerator {
    /// Compile `source`. Syntax errors are reported immediately.
    pub fn new(source: impl Into<String>, seed: u64) -> Result<Self> {
        let layouts: SharedLayouts = Arc::new(RwLock::new(ScriptLayouts::default()));
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, layouts.clone());

        let mut generator = Self {
            engine,
            source: String::new(),
            ast: None,
            seed,
            layouts,
            changed: true,
        };
        generator.set_source(source)?;
        Ok(generator)
    }

    fn configure_engine(engine: &mut Engine, layouts: SharedLayouts) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(50_000_000);
        engine.set_max_array_size(10_000_000);

        {
            let l = layouts.clone();
            engine.register_fn("src_count", move || -> i64 {
                l.read().map(|l| l.src.len() as i64).unwrap_or(0)
            });
        }
        {
            let l = layouts.clone();
            engine.register_fn("dst_count", move || -> i64 {
                l.read().map(|l| l.dst.len() as i64).unwrap_or(0)
            });
        }
        {
            let l = layouts.clone();
            engine.register_fn("src_pos", move |i: i64| -> Array {
                l.read()
                    .ok()
                    .and_then(|l| usize::try_from(i).ok().and_then(|i| l.src.get(i).copied()))
                    .map(pos_array)
                    .unwrap_or_default()
            });
        }
        {
            let l = layouts.clone();
            engine.register_fn("dst_pos", move |j: i64| -> Array {
                l.read()
                    .ok()
                    .and_then(|l| usize::try_from(j).ok().and_then(|j| l.dst.get(j).copied()))
                    .map(pos_array)
                    .unwrap_or_default()
            });
        }
        {
            let l = layouts.clone();
            engine.register_fn("distance", move |i: i64, j: i64| -> f64 {
                let Ok(l) = l.read() else { return f64::NAN };
                let a = usize::try_from(i).ok().and_then(|i| l.src.get(i).copied());
                let b = usize::try_from(j).ok().and_then(|j| l.dst.get(j).copied());
                match (a, b) {
                    (Some(a), Some(b)) => a.distance(b) as f64,
                    _ => f64::NAN,
                }
            });
        }
        {
            let l = layouts;
            engine.register_fn("rand", move || -> f64 {
                l.write().map(|mut l| l.rng.random::<f64>()).unwrap_or(0.0)
            });
        }
    }

    /// Replace the script and mark the list for regeneration
    pub fn set_source(&mut self, source: impl Into<String>) -> Result<()> {
        let source = source.into();
        let ast = self
            .engine
            .compile(&source)
            .map_err(|e| SpikeVizError::Script(format!("Compile error: {}", e)))?;
        self.source = source;
        self.ast = Some(ast);
        self.changed = true;
        Ok(())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_seed(&mut self, seed: u64) {
        if seed != self.seed {
            self.seed = seed;
            self.changed = true;
        }
    }

    fn to_link(index: usize, item: Dynamic) -> Result<Link> {
        let fields = item.try_cast::<Array>().ok_or_else(|| {
            SpikeVizError::Script(format!("link {} is not an array", index))
        })?;
        if fields.len() < 2 || fields.len() > 3 {
            return Err(SpikeVizError::Script(format!(
                "link {} must have 2 or 3 fields, got {}",
                index,
                fields.len()
            )));
        }
        let as_index = |d: &Dynamic| -> Result<u32> {
            d.as_int()
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| SpikeVizError::Script(format!("link {} has a bad index", index)))
        };
        let metric = match fields.get(2) {
            Some(d) => d
                .as_float()
                .or_else(|_| d.as_int().map(|v| v as f64))
                .map_err(|_| SpikeVizError::Script(format!("link {} has a bad metric", index)))?
                as f32,
            None => 0.0,
        };
        Ok(Link::with_metric(as_index(&fields[0])?, as_index(&fields[1])?, metric))
    }
}

impl ConnectionGenerator for ScriptGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Script
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn regenerate(&mut self, src_layout: &[Vec3], dst_layout: &[Vec3]) -> Result<Vec<Link>> {
        let ast = self
            .ast
            .as_ref()
            .ok_or_else(|| SpikeVizError::Script("no script compiled".to_string()))?;

        {
            let mut layouts = self
                .layouts
                .write()
                .map_err(|e| SpikeVizError::Script(format!("Failed to acquire layout lock: {}", e)))?;
            layouts.src = src_layout.to_vec();
            layouts.dst = dst_layout.to_vec();
            layouts.rng = StdRng::seed_from_u64(self.seed);
        }

        let mut scope = Scope::new();
        let result = self
            .engine
            .eval_ast_with_scope::<Array>(&mut scope, ast)
            .context("Connection script failed")?;

        let links = result
            .into_iter()
            .enumerate()
            .map(|(i, item)| Self::to_link(i, item))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Script generated {} links", links.len());
        Ok(links)
    }

    fn set_unchanged(&mut self) {
        self.changed = false;
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "type": "script", "seed": self.seed, "source": self.source })
    }
}
