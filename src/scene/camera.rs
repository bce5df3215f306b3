//! Camera state and view/projection matrices
//!
//! The camera keeps three independently driven pieces of state: `zoom`
//! (wheel), `pan` (primary drag) and `rotation` (secondary drag). The view
//! matrix applies them as ordered transforms: translate back by the zoomed
//! distance, pan, tilt and spin, then translate the focus center to the
//! origin.

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::types::Bounds3;

/// Offset applied to the whole scene before the camera transform
pub const SCENE_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -5.0);

/// Zoom is reset to 1 when a wheel step pushes it below this
const MIN_ZOOM: f32 = 1e-5;

/// Smallest orthographic half-width
const MIN_ORTHO_HALF_WIDTH: f32 = 10.0;

/// Fraction of the visible extent used as the orthographic half-width
const ORTHO_FIT_FACTOR: f32 = 0.75;

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// What the camera looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    /// Fixed three-quarter view over a layout preview
    Preview(Bounds3),
    /// Orbit around one population's layout
    Focus(Bounds3),
    /// Nothing to focus on
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub zoom: f32,
    pub pan: Vec2,
    /// Accumulated orbit in degrees, x spins about z and y tilts about x
    pub rotation: Vec2,
    pub orthographic: bool,
    config: CameraConfig,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            rotation: Vec2::ZERO,
            orthographic: config.start_orthographic,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Apply a wheel delta, positive deltas zoom out
    pub fn wheel(&mut self, delta: f32) {
        self.zoom *= 2f32.powf(delta / self.config.wheel_divisor);
        if !self.zoom.is_finite() || self.zoom < MIN_ZOOM {
            self.zoom = 1.0;
        }
    }

    /// Apply a mouse drag in screen pixels (y down)
    pub fn drag(&mut self, button: DragButton, delta: Vec2) {
        match button {
            DragButton::Primary => self.pan_by(delta),
            DragButton::Secondary => self.orbit_by(delta),
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += Vec2::new(delta.x, -delta.y) * self.config.pan_speed * self.zoom;
    }

    pub fn orbit_by(&mut self, delta: Vec2) {
        self.rotation += delta * self.config.orbit_speed;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        self.rotation = Vec2::ZERO;
    }

    /// View matrix for `mode`
    pub fn view(&self, mode: ViewMode) -> Mat4 {
        match mode {
            ViewMode::Preview(bounds) => {
                Mat4::from_translation(Vec3::new(0.0, 0.0, -bounds.max_extent() * 1.3))
                    * Mat4::from_rotation_x((-45f32).to_radians())
                    * Mat4::from_translation(Vec3::new(0.0, 2.5, 2.5))
                    * Mat4::from_rotation_z(45f32.to_radians())
                    * Mat4::from_translation(-bounds.center())
            }
            ViewMode::Focus(bounds) => {
                Mat4::from_translation(Vec3::new(0.0, 0.0, -bounds.max_extent() * 1.2 * self.zoom))
                    * Mat4::from_translation(self.pan.extend(0.0))
                    * Mat4::from_rotation_x((-45.0 + self.rotation.y).to_radians())
                    * Mat4::from_translation(Vec3::new(0.0, 2.5, 2.5))
                    * Mat4::from_rotation_z((45.0 + self.rotation.x).to_radians())
                    * Mat4::from_translation(-bounds.center())
            }
            ViewMode::Default => {
                Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0 * self.zoom))
                    * Mat4::from_translation(self.pan.extend(0.0))
                    * Mat4::from_rotation_x((-45f32).to_radians())
                    * Mat4::from_rotation_z(45f32.to_radians())
            }
        }
    }

    /// Projection matrix.
    ///
    /// Orthographic mode fits its volume to `visible`, the bounds of all
    /// drawn geometry, never narrower than a fixed minimum.
    pub fn projection(&self, viewport: Viewport, visible: Option<Bounds3>) -> Mat4 {
        if self.orthographic {
            let extent = visible.map(|b| b.max_extent() * ORTHO_FIT_FACTOR).unwrap_or(0.0);
            let half_width = self.zoom * extent.max(MIN_ORTHO_HALF_WIDTH);
            let half_height = half_width / viewport.aspect();
            Mat4::orthographic_rh_gl(-half_width, half_width, -half_height, half_height, -100.0, self.config.far)
        } else {
            Mat4::perspective_rh_gl(
                self.config.fov_degrees.to_radians(),
                viewport.aspect(),
                self.config.near,
                self.config.far,
            )
        }
    }
}

/// Project a world point to pixel coordinates (y down) and NDC depth.
///
/// Returns `None` for points behind the eye.
pub fn project(view_proj: Mat4, point: Vec3, viewport: Viewport) -> Option<(Vec2, f32)> {
    let clip = view_proj * point.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    if !ndc.is_finite() {
        return None;
    }
    let screen = Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.width,
        (1.0 - ndc.y) * 0.5 * viewport.height,
    );
    Some((screen, ndc.z))
}

/// On-screen radius of a sphere of `radius` at `center`
pub fn projected_radius(view: Mat4, view_proj: Mat4, center: Vec3, radius: f32, viewport: Viewport) -> Option<f32> {
    let right = view.row(0).truncate().normalize_or_zero();
    let (c, _) = project(view_proj, center, viewport)?;
    let (e, _) = project(view_proj, center + right * radius, viewport)?;
    Some(c.distance(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds3 {
        Bounds3 {
            min: Vec3::new(-2.0, -2.0, 0.0),
            max: Vec3::new(2.0, 2.0, 0.0),
        }
    }

    #[test]
    fn test_wheel_zoom_is_exponential() {
        let mut cam = Camera::default();
        cam.wheel(320.0);
        assert!((cam.zoom - 2.0).abs() < 1e-6);
        cam.wheel(-640.0);
        assert!((cam.zoom - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_wheel_zoom_resets_when_tiny() {
        let mut cam = Camera::default();
        cam.wheel(-320.0 * 20.0);
        assert_eq!(cam.zoom, 1.0);
    }

    #[test]
    fn test_pan_and_orbit_are_independent() {
        let mut cam = Camera::default();
        cam.drag(DragButton::Primary, Vec2::new(100.0, 50.0));
        assert!(cam.pan.abs_diff_eq(Vec2::new(1.0, -0.5), 1e-6));
        assert_eq!(cam.rotation, Vec2::ZERO);

        cam.drag(DragButton::Secondary, Vec2::new(10.0, -4.0));
        assert_eq!(cam.rotation, Vec2::new(5.0, -2.0));
        assert!(cam.pan.abs_diff_eq(Vec2::new(1.0, -0.5), 1e-6));
    }

    #[test]
    fn test_pan_scales_with_zoom() {
        let mut cam = Camera::default();
        cam.zoom = 4.0;
        cam.pan_by(Vec2::new(10.0, 0.0));
        assert!((cam.pan.x - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_focus_view_centers_layout() {
        let cam = Camera::default();
        let b = bounds().translated(Vec3::new(10.0, 5.0, 0.0));
        let view = cam.view(ViewMode::Focus(b));
        let proj = cam.projection(Viewport::new(800.0, 600.0), Some(b));
        let (screen, _) = project(proj * view, b.center(), Viewport::new(800.0, 600.0)).expect("in front");
        // the center lands on the vertical middle line of the viewport
        assert!((screen.x - 400.0).abs() < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_not_projected() {
        let cam = Camera::default();
        let view = cam.view(ViewMode::Default);
        let proj = cam.projection(Viewport::new(100.0, 100.0), None);
        // well behind the eye along the view direction
        let eye_back = view.inverse().transform_point3(Vec3::new(0.0, 0.0, 50.0));
        assert!(project(proj * view, eye_back, Viewport::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_orthographic_fits_visible_bounds() {
        let mut cam = Camera::default();
        cam.orthographic = true;
        let vp = Viewport::new(200.0, 100.0);
        let small = cam.projection(vp, Some(bounds()));
        let big_bounds = Bounds3 {
            min: Vec3::splat(-50.0),
            max: Vec3::splat(50.0),
        };
        let big = cam.projection(vp, Some(big_bounds));
        // x scale is 1 / half_width
        assert!((small.x_axis.x - 1.0 / 10.0).abs() < 1e-6);
        assert!((big.x_axis.x - 1.0 / 75.0).abs() < 1e-6);
        // aspect keeps pixels square
        assert!((small.y_axis.y - 2.0 / 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_projected_radius_positive() {
        let cam = Camera::default();
        let vp = Viewport::new(400.0, 400.0);
        let view = cam.view(ViewMode::Default);
        let proj = cam.projection(vp, None);
        let r = projected_radius(view, proj * view, Vec3::ZERO, 0.5, vp).expect("visible");
        assert!(r > 0.0);
    }
}
