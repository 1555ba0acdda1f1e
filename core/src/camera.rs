use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

// Stay just short of the poles so look_at never sees eye-target parallel to up
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.017_453_292;

/// Camera orbiting a target point; yaw around +Y, pitch above the XZ plane.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 35.0_f32.to_radians(), 3.0)
    }
}

impl OrbitCamera {
    pub fn new(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        let mut camera = Self {
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1.0,
            min_distance: 0.5,
            max_distance: 8.0,
        };
        camera.orbit(yaw, pitch);
        camera.distance = distance.clamp(camera.min_distance, camera.max_distance);
        camera
    }

    /// Eye at `(0, 0, distance)` looking at the origin, +Y up.
    pub fn looking_down_z(distance: f32) -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0, distance)
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        if !(d_yaw.is_finite() && d_pitch.is_finite()) {
            return;
        }
        self.yaw = (self.yaw + d_yaw + PI).rem_euclid(TAU) - PI;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Multiply the orbit distance; `factor < 1` moves closer.
    pub fn zoom(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }
}

/// Symmetric view frustum sized from the surface aspect ratio.
///
/// `half_height` is the top edge at the near plane; the horizontal half-width
/// is `half_height * width / height`, so the scene keeps its proportions when
/// the surface rotates or resizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub near: f32,
    pub far: f32,
    pub half_height: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 10.0,
            half_height: 1.0,
        }
    }
}

impl Projection {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(TerrainError::InvalidProjection("near must be positive".into()));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(TerrainError::InvalidProjection("far must exceed near".into()));
        }
        if !(self.half_height.is_finite() && self.half_height > 0.0) {
            return Err(TerrainError::InvalidProjection("half_height must be positive".into()));
        }
        Ok(())
    }

    pub fn matrix(&self, width: u32, height: u32) -> Result<Mat4, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptySurface { width, height });
        }
        self.validate()?;
        let ratio = width as f32 / height as f32;
        let top = self.half_height;
        let right = ratio * top;
        Ok(frustum(-right, right, -top, top, self.near, self.far))
    }
}

/// OpenGL-style perspective frustum (clip z in [-1, 1]), column-major.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn looking_down_z_places_eye_on_axis() {
        let cam = OrbitCamera::looking_down_z(2.0);
        assert!(cam.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
        let expected = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y);
        assert!(approx(cam.view_matrix(), expected));
    }

    #[test]
    fn eye_keeps_distance_from_target() {
        let mut cam = OrbitCamera::new(Vec3::new(1.0, 0.5, -2.0), 0.7, 0.4, 3.0);
        cam.orbit(1.3, -0.2);
        assert!(((cam.eye() - cam.target).length() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_poles() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 10.0);
        assert!(cam.pitch() < FRAC_PI_2);
        cam.orbit(0.0, -20.0);
        assert!(cam.pitch() > -FRAC_PI_2);
        // still a valid view matrix at the limit
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn yaw_wraps() {
        let mut cam = OrbitCamera::default();
        cam.orbit(3.0 * PI, 0.0);
        assert!((-PI..PI).contains(&cam.yaw()));
        assert!((cam.yaw().abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn zoom_clamps_and_ignores_garbage() {
        let mut cam = OrbitCamera::default();
        cam.zoom(0.001);
        assert_eq!(cam.distance(), cam.min_distance);
        cam.zoom(1e6);
        assert_eq!(cam.distance(), cam.max_distance);
        let before = cam.distance();
        cam.zoom(-1.0);
        cam.zoom(f32::NAN);
        assert_eq!(cam.distance(), before);
    }

    #[test]
    fn frustum_matches_perspective_for_same_fov() {
        let proj = Projection {
            near: 1.0,
            far: 10.0,
            half_height: 1.0,
        };
        // top / near = tan(fov / 2) => 90 degrees
        let expected = Mat4::perspective_rh_gl(FRAC_PI_2, 16.0 / 9.0, 1.0, 10.0);
        assert!(approx(proj.matrix(1600, 900).unwrap(), expected));
    }

    #[test]
    fn frustum_maps_near_and_far_planes() {
        let m = frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let near = m * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = m * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_surface_is_rejected() {
        let proj = Projection::default();
        assert!(matches!(
            proj.matrix(0, 480),
            Err(TerrainError::EmptySurface { width: 0, height: 480 })
        ));
    }

    #[test]
    fn inverted_planes_are_rejected() {
        let proj = Projection {
            near: 5.0,
            far: 1.0,
            ..Projection::default()
        };
        assert!(proj.matrix(10, 10).is_err());
    }
}
