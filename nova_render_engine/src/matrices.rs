//! Projection-matrix helpers for a [0, 1] depth-range device
//!
//! Pure `glam` functions: depth-range conversion for matrices built against
//! a [-1, 1] convention, perspective/orthographic builders with the
//! infinite-far-plane adjustment, and the oblique near-plane projection.
//!
//! Matrices are column-major `Mat4`; `m.col(c)[r]` is row `r`, column `c`.

use glam::{Mat4, Vec4};

/// Adjustment keeping an infinite far plane numerically stable
pub const INFINITE_FAR_PLANE_ADJUST: f32 = 0.00001;

/// Convert a [-1, 1] depth-range projection matrix to [0, 1]
///
/// When `for_gpu_program` is false the matrix additionally flips from
/// right-handed to left-handed, matching what the fixed-function half of the
/// original pipeline expected.
pub fn convert_projection_matrix(matrix: &Mat4, for_gpu_program: bool) -> Mat4 {
    let mut m = matrix.to_cols_array_2d();

    // Convert depth range from [-1,+1] to [0,1]: row2 = (row2 + row3) / 2
    for c in 0..4 {
        m[c][2] = (m[c][2] + m[c][3]) / 2.0;
    }

    if !for_gpu_program {
        // Convert right-handed to left-handed: negate column 2
        for r in 0..4 {
            m[2][r] = -m[2][r];
        }
    }

    Mat4::from_cols_array_2d(&m)
}

/// Perspective projection for a vertical field of view
///
/// `far_plane == 0.0` selects an infinite far plane.
pub fn make_projection_matrix(
    fovy_radians: f32,
    aspect: f32,
    near_plane: f32,
    far_plane: f32,
    for_gpu_program: bool,
) -> Mat4 {
    let theta = fovy_radians * 0.5;
    let h = 1.0 / theta.tan();
    let w = h / aspect;

    let (q, qn) = if far_plane == 0.0 {
        (
            1.0 - INFINITE_FAR_PLANE_ADJUST,
            near_plane * (INFINITE_FAR_PLANE_ADJUST - 1.0),
        )
    } else {
        let q = far_plane / (far_plane - near_plane);
        (q, -q * near_plane)
    };

    let mut m = [[0.0f32; 4]; 4];
    m[0][0] = w;
    m[1][1] = h;
    if for_gpu_program {
        m[2][2] = -q;
        m[2][3] = -1.0;
    } else {
        m[2][2] = q;
        m[2][3] = 1.0;
    }
    m[3][2] = qn;

    Mat4::from_cols_array_2d(&m)
}

/// Orthographic projection for a vertical field of view at the near plane
pub fn make_ortho_matrix(
    fovy_radians: f32,
    aspect: f32,
    near_plane: f32,
    far_plane: f32,
    for_gpu_program: bool,
) -> Mat4 {
    let theta_y = fovy_radians / 2.0;
    let tan_theta_y = theta_y.tan();
    let tan_theta_x = tan_theta_y * aspect;

    let half_w = tan_theta_x * near_plane;
    let half_h = tan_theta_y * near_plane;
    let iw = 1.0 / half_w;
    let ih = 1.0 / half_h;

    let q = if far_plane == 0.0 {
        0.0
    } else {
        1.0 / (far_plane - near_plane)
    };

    let mut m = [[0.0f32; 4]; 4];
    m[0][0] = iw;
    m[1][1] = ih;
    m[2][2] = if for_gpu_program { -q } else { q };
    m[3][2] = -near_plane / (far_plane - near_plane);
    m[3][3] = 1.0;

    Mat4::from_cols_array_2d(&m)
}

/// Replace the near plane of a projection matrix with an oblique clip plane
///
/// The plane is given in camera space as `(normal, d)`. Based on Lengyel's
/// clip-space corner derivation, adapted for a right-handed projection.
pub fn apply_oblique_depth_projection(
    matrix: &Mat4,
    plane_normal: glam::Vec3,
    plane_d: f32,
    for_gpu_program: bool,
) -> Mat4 {
    let mut m = matrix.to_cols_array_2d();

    // Clip-space corner opposite the clipping plane, transformed into
    // camera space
    let qx = sign(plane_normal.x) / m[0][0];
    let qy = sign(plane_normal.y) / m[1][1];
    let qz = 1.0;
    let qw = if for_gpu_program {
        (1.0 - m[2][2]) / m[3][2]
    } else {
        (1.0 + m[2][2]) / m[3][2]
    };
    let q = Vec4::new(qx, qy, qz, qw);

    let clip_plane = Vec4::new(plane_normal.x, plane_normal.y, plane_normal.z, plane_d);
    let c = clip_plane * (1.0 / clip_plane.dot(q));

    // Replace the third row of the projection matrix
    m[0][2] = c.x;
    m[1][2] = c.y;
    m[2][2] = if for_gpu_program { c.z } else { -c.z };
    m[3][2] = c.w;

    Mat4::from_cols_array_2d(&m)
}

fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "matrices_tests.rs"]
mod tests;
