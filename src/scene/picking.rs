//! Colour-coded picking
//!
//! Every neuron glyph is drawn into an off-screen buffer in a flat colour
//! that encodes `(population index, neuron low byte, neuron high byte)`.
//! Reading the pixel under the cursor and decoding it identifies the
//! neuron. The buffer is cleared to white, which never decodes because
//! population index 255 is reserved.

use glam::Vec2;

/// Colour the pick buffer is cleared to
pub const PICK_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Population indices must stay below this to be pickable
pub const MAX_PICKABLE_POPULATIONS: usize = 255;

/// Neuron indices must stay below this to be pickable
pub const MAX_PICKABLE_NEURONS: usize = 1 << 16;

/// Neuron identified by a pick, as indices into the drawn populations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickIndex {
    pub population: usize,
    pub neuron: usize,
}

/// Pick colour for neuron `neuron` of drawn population `population`
pub fn encode_pick(population: usize, neuron: usize) -> Option<[u8; 3]> {
    if population >= MAX_PICKABLE_POPULATIONS || neuron >= MAX_PICKABLE_NEURONS {
        return None;
    }
    Some([population as u8, (neuron & 0xFF) as u8, ((neuron >> 8) & 0xFF) as u8])
}

/// Decode a pick colour.
///
/// `neuron_counts[i]` is the number of neurons drawn for population `i`;
/// anything outside those bounds (including the background) is no hit.
pub fn decode_pick(colour: [u8; 3], neuron_counts: &[usize]) -> Option<PickIndex> {
    let population = colour[0] as usize;
    if population >= MAX_PICKABLE_POPULATIONS {
        return None;
    }
    let neuron = colour[1] as usize | ((colour[2] as usize) << 8);
    let count = *neuron_counts.get(population)?;
    if neuron < count {
        Some(PickIndex { population, neuron })
    } else {
        None
    }
}

/// Software pick target with a depth test
#[derive(Debug, Clone)]
pub struct PickBuffer {
    width: usize,
    height: usize,
    colours: Vec<[u8; 3]>,
    depth: Vec<f32>,
}

impl PickBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            colours: vec![PICK_BACKGROUND; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.colours.fill(PICK_BACKGROUND);
        self.depth.fill(f32::INFINITY);
    }

    /// Rasterise a disc; nearer fragments win
    pub fn fill_disc(&mut self, center: Vec2, radius: f32, depth: f32, colour: [u8; 3]) {
        if !center.is_finite() || !(radius > 0.0) {
            return;
        }
        let x0 = (center.x - radius).floor().max(0.0) as usize;
        let y0 = (center.y - radius).floor().max(0.0) as usize;
        let x1 = ((center.x + radius).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((center.y + radius).ceil().max(0.0) as usize).min(self.height);
        let r2 = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if p.distance_squared(center) > r2 {
                    continue;
                }
                let i = y * self.width + x;
                if depth < self.depth[i] {
                    self.depth[i] = depth;
                    self.colours[i] = colour;
                }
            }
        }
    }

    /// Colour at a pixel, background outside the buffer
    pub fn read(&self, x: f32, y: f32) -> [u8; 3] {
        if !(x >= 0.0 && y >= 0.0) {
            return PICK_BACKGROUND;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return PICK_BACKGROUND;
        }
        self.colours[y * self.width + x]
    }
}
