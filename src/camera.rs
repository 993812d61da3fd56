use glam::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub enum CameraProjection {
    Perspective {
        aspect: Option<f32>,
        yfov: f32,
        znear: f32,
        zfar: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

impl CameraProjection {
    pub fn update_aspect(&mut self, new_aspect: f32) {
        if let CameraProjection::Perspective { aspect, .. } = self {
            *aspect = Some(new_aspect);
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match self {
            CameraProjection::Perspective {
                aspect,
                yfov,
                znear,
                zfar,
            } => {
                let aspect = aspect.unwrap_or(1.0);
                if let Some(zfar) = zfar {
                    Mat4::perspective_rh(yfov.to_radians(), aspect, *znear, *zfar)
                } else {
                    Mat4::perspective_infinite_rh(yfov.to_radians(), aspect, *znear)
                }
            }
            CameraProjection::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            } => Mat4::orthographic_rh(
                -*xmag / 2.0,
                *xmag / 2.0,
                -*ymag / 2.0,
                *ymag / 2.0,
                *znear,
                *zfar,
            ),
        }
    }
}

/// Orbit-style look-at view.
#[derive(Debug, Clone)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl CameraView {
    pub fn matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// The camera collaborator: everything this crate reads from it is the
/// pair of matrices, composed per draw call as
/// `projection × (view × world)`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub view: CameraView,
    pub projection: CameraProjection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: CameraView {
                eye: Vec3::new(2.5, -1.5, 1.5),
                target: Vec3::new(0.0, 0.0, 0.75),
                up: Vec3::Z,
            },
            projection: CameraProjection::Perspective {
                aspect: None,
                yfov: 60.0,
                znear: 0.01,
                zfar: None,
            },
        }
    }
}

impl Camera {
    pub fn new(view: CameraView, projection: CameraProjection) -> Self {
        Self { view, projection }
    }

    pub fn update_aspect(&mut self, new_aspect: f32) {
        self.projection.update_aspect(new_aspect);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view.matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }
}
