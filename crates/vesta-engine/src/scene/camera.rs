use glam::{Mat4, Vec2, Vec3};

/// A half-line in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the plane through `point` with normal `normal`.
    ///
    /// `None` when the ray is parallel to the plane or points away from it.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Perspective camera as a plain value.
///
/// The basis is kept orthonormal; `extent` is the half-size of the near plane
/// in world units, so `extent / near` gives the tangents of the half field of
/// view. The projection has no far plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub location: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    pub near: f32,
    pub extent: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self::with_fov(60.0, 16.0 / 9.0, 0.1);
        camera.location = Vec3::new(0.0, 6.0, 10.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        camera
    }
}

impl Camera {
    /// Camera at the origin looking down -Z.
    pub fn with_fov(fov_y_degrees: f32, aspect: f32, near: f32) -> Self {
        let half_h = near * (fov_y_degrees.to_radians() * 0.5).tan();
        Self {
            location: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            near,
            extent: Vec2::new(half_h * aspect, half_h),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Points the camera at `target`, keeping `world_up` as close to up as possible.
    pub fn look_at(&mut self, target: Vec3, world_up: Vec3) {
        let forward = (target - self.location).try_normalize().unwrap_or(self.forward);
        self.set_orientation(forward, world_up);
    }

    /// Rebuilds an orthonormal basis from a forward direction and an up hint.
    pub fn set_orientation(&mut self, forward: Vec3, up_hint: Vec3) {
        let forward = forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward
            .cross(up_hint)
            .try_normalize()
            .or_else(|| forward.cross(Vec3::Z).try_normalize())
            .unwrap_or(Vec3::X);
        self.forward = forward;
        self.right = right;
        self.up = right.cross(forward);
    }

    /// Widens or narrows the horizontal extent to match a viewport.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.extent.x = self.extent.y * aspect;
    }

    pub fn aspect(&self) -> f32 {
        self.extent.x / self.extent.y
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.location, self.forward, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        let fov_y = 2.0 * (self.extent.y / self.near).atan();
        Mat4::perspective_infinite_rh(fov_y, self.aspect(), self.near)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray through the center of pixel `(x, y)` of a `width` x `height` viewport.
    ///
    /// Pixel rows grow downwards, matching attachment read-back coordinates.
    pub fn screen_ray(&self, x: f32, y: f32, width: u32, height: u32) -> Ray {
        let ndc_x = (x + 0.5) / width.max(1) as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y + 0.5) / height.max(1) as f32 * 2.0;

        let direction = self.forward
            + self.right * (ndc_x * self.extent.x / self.near)
            + self.up * (ndc_y * self.extent.y / self.near);

        Ray {
            origin: self.location,
            direction: direction.normalize(),
        }
    }

    /// Transform for a camera-facing quad in the XY plane centered at `position`.
    pub fn billboard(&self, position: Vec3, scale: f32) -> Mat4 {
        Mat4::from_cols(
            (self.right * scale).extend(0.0),
            (self.up * scale).extend(0.0),
            (-self.forward * scale).extend(0.0),
            position.extend(1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn look_at_builds_orthonormal_basis() {
        let mut cam = Camera::default();
        cam.location = Vec3::new(3.0, 4.0, 5.0);
        cam.look_at(Vec3::ZERO, Vec3::Y);

        assert!((cam.forward().length() - 1.0).abs() < 1e-5);
        assert!(cam.forward().dot(cam.right()).abs() < 1e-5);
        assert!(cam.forward().dot(cam.up()).abs() < 1e-5);
        assert!(cam.up().y > 0.0);
    }

    #[test]
    fn looking_straight_down_keeps_a_valid_basis() {
        let mut cam = Camera::default();
        cam.location = Vec3::new(0.0, 10.0, 0.0);
        cam.look_at(Vec3::ZERO, Vec3::Y);

        assert!(approx(cam.forward(), Vec3::NEG_Y));
        assert!((cam.right().length() - 1.0).abs() < 1e-5);
        assert!((cam.up().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn center_ray_follows_forward() {
        let cam = Camera::default();
        // Pixel (49.5, 49.5) has its center exactly at the viewport center.
        let ray = cam.screen_ray(49.5, 49.5, 100, 100);
        assert!(approx(ray.direction, cam.forward()));
    }

    #[test]
    fn screen_ray_reprojects_to_its_pixel() {
        let mut cam = Camera::default();
        cam.set_aspect(200, 100);
        let (x, y) = (37.0, 81.0);
        let ray = cam.screen_ray(x, y, 200, 100);

        let clip = cam.view_projection() * ray.at(25.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let px = (ndc.x + 1.0) * 0.5 * 200.0 - 0.5;
        let py = (1.0 - ndc.y) * 0.5 * 100.0 - 0.5;

        assert!((px - x).abs() < 1e-2, "x {px}");
        assert!((py - y).abs() < 1e-2, "y {py}");
    }

    #[test]
    fn ray_hits_ground_plane_below_camera() {
        let ray = Ray {
            origin: Vec3::new(0.0, 2.0, 0.0),
            direction: Vec3::new(1.0, -1.0, 0.0).normalize(),
        };
        let hit = ray.intersect_plane(Vec3::ZERO, Vec3::Y).expect("hit");
        assert!(approx(hit, Vec3::new(2.0, 0.0, 0.0)));

        let away = Ray {
            origin: Vec3::new(0.0, 2.0, 0.0),
            direction: Vec3::Y,
        };
        assert!(away.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn set_aspect_keeps_vertical_extent() {
        let mut cam = Camera::with_fov(60.0, 1.0, 0.1);
        let h = cam.extent.y;
        cam.set_aspect(300, 100);
        assert_eq!(cam.extent.y, h);
        assert!((cam.aspect() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn billboard_faces_the_camera() {
        let cam = Camera::default();
        let m = cam.billboard(Vec3::new(1.0, 2.0, 3.0), 2.0);
        let normal = m.transform_vector3(Vec3::Z).normalize();
        assert!(approx(normal, -cam.forward()));
        assert!(approx(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
    }
}
