use glam::{Mat3, Mat4, Quat, Vec3};

use crate::{
    camera::Camera,
    render::{DrawParams, DrawStyle, RenderBackend},
};

pub mod shape;

const SHAFT_SEGMENTS: u32 = 16;
const HEAD_SEGMENTS: u32 = 32;
const SPHERE_SUBDIVISIONS: u32 = 2;

/// Immediate-mode overlay shapes: boxes, spheres, lines, arrows and
/// coordinate frames, drawn fresh each frame on top of the retained scene.
///
/// The unit solids are compiled once at construction and reused with
/// per-call scale and rotation; only line geometry is rebuilt per call.
pub struct PrimitiveDrawer<B: RenderBackend> {
    cube: B::MeshHandle,
    sphere: B::MeshHandle,
    cylinder: B::MeshHandle,
    cone: B::MeshHandle,
}

impl<B: RenderBackend> PrimitiveDrawer<B> {
    pub fn new(backend: &mut B) -> Self {
        Self {
            cube: backend.compile_mesh(&shape::cube()),
            sphere: backend.compile_mesh(&shape::icosphere(SPHERE_SUBDIVISIONS)),
            cylinder: backend.compile_mesh(&shape::cylinder(1.0, 1.0, SHAFT_SEGMENTS)),
            cone: backend.compile_mesh(&shape::cone(1.0, 1.0, HEAD_SEGMENTS)),
        }
    }

    fn draw(
        &self,
        backend: &mut B,
        camera: &Camera,
        mesh: &B::MeshHandle,
        style: DrawStyle<B::TextureHandle>,
        world: Mat4,
    ) {
        let params = DrawParams::for_world(
            camera.view_matrix(),
            camera.projection_matrix(),
            world,
            style,
        );
        backend.draw_mesh(mesh, &params);
    }

    /// Oriented box with full extents `size`, centered on `center`.
    pub fn draw_box(
        &self,
        backend: &mut B,
        camera: &Camera,
        center: Vec3,
        orientation: Mat3,
        size: Vec3,
        color: [f32; 4],
    ) {
        let world = Mat4::from_translation(center)
            * Mat4::from_mat3(orientation)
            * Mat4::from_scale(size / 2.0);
        self.draw(backend, camera, &self.cube, DrawStyle::colored(color), world);
    }

    pub fn draw_sphere(
        &self,
        backend: &mut B,
        camera: &Camera,
        center: Vec3,
        radius: f32,
        color: [f32; 4],
    ) {
        let world = Mat4::from_translation(center) * Mat4::from_scale(Vec3::splat(radius));
        self.draw(backend, camera, &self.sphere, DrawStyle::colored(color), world);
    }

    /// Unlit line segment between two world-space points. Lines rasterize
    /// one pixel wide regardless of `thickness`; the parameter is accepted
    /// so callers can express intent that a wide-line backend would honor.
    pub fn draw_line(
        &self,
        backend: &mut B,
        camera: &Camera,
        start: Vec3,
        end: Vec3,
        _thickness: f32,
        color: [f32; 4],
    ) {
        let mesh = backend.compile_mesh(&shape::line(start, end));
        let params = DrawParams::for_world(
            camera.view_matrix(),
            camera.projection_matrix(),
            Mat4::IDENTITY,
            DrawStyle::Flat { color },
        );
        backend.draw_mesh(&mesh, &params);
    }

    /// Arrow from `start` to `end`: a cylinder shaft capped by a cone head.
    ///
    /// `head_len` is clamped to the arrow's length, so a short arrow
    /// degrades to head only. A zero-length arrow draws nothing, and a
    /// zero shaft or head diameter omits that part.
    pub fn draw_arrow(
        &self,
        backend: &mut B,
        camera: &Camera,
        start: Vec3,
        end: Vec3,
        shaft_diam: f32,
        head_diam: f32,
        head_len: f32,
        color: [f32; 4],
    ) {
        let direction = end - start;
        let length = direction.length();
        if length == 0.0 {
            return;
        }
        let normal = direction / length;
        let head_len = head_len.min(length);
        let shaft_len = length - head_len;

        // Rotation taking the canonical +Y solids onto the arrow axis.
        let mut axis = normal.cross(Vec3::Y);
        if axis.length_squared() == 0.0 {
            axis = Vec3::X;
        }
        let rotation = Quat::from_axis_angle(axis.normalize(), -normal.angle_between(Vec3::Y));

        let style = DrawStyle::colored(color);
        if shaft_len > 0.0 && shaft_diam > 0.0 {
            let world = Mat4::from_scale_rotation_translation(
                Vec3::new(shaft_diam / 2.0, shaft_len / 2.0, shaft_diam / 2.0),
                rotation,
                start + normal * (shaft_len / 2.0),
            );
            self.draw(backend, camera, &self.cylinder, style.clone(), world);
        }
        if head_len > 0.0 && head_diam > 0.0 {
            let world = Mat4::from_scale_rotation_translation(
                Vec3::new(head_diam / 2.0, head_len / 2.0, head_diam / 2.0),
                rotation,
                start + normal * (shaft_len + head_len / 2.0),
            );
            self.draw(backend, camera, &self.cone, style, world);
        }
    }

    /// Coordinate frame at `pose`: unit axis lines scaled by `scale`,
    /// X red, Y green, Z blue.
    pub fn draw_frame(&self, backend: &mut B, camera: &Camera, pose: Mat4, scale: f32) {
        let origin = pose.transform_point3(Vec3::ZERO);
        let axes = [
            (Vec3::X, [1.0, 0.0, 0.0, 1.0]),
            (Vec3::Y, [0.0, 1.0, 0.0, 1.0]),
            (Vec3::Z, [0.0, 0.0, 1.0, 1.0]),
        ];
        for (axis, color) in axes {
            let end = pose.transform_point3(axis * scale);
            self.draw_line(backend, camera, origin, end, 1.0, color);
        }
    }
}
