use crate::math::vec::Vec3;

/// Column-major 4x4 matrix laid out the way WGSL expects `mat4x4<f32>`.
///
/// `m.0[c]` is column `c`. [`Mat4::multiply`] composes like the math notation,
/// so `a.multiply(&b)` applies `b` first.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Mat4 {
    pub fn identity() -> Mat4 {
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed perspective projection with a `0..1` depth range.
    pub fn perspective(
        field_of_view_y_in_radians: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    ) -> Mat4 {
        let f = 1.0 / (field_of_view_y_in_radians * 0.5).tan();
        let range_reciprocal = 1.0 / (z_near - z_far);

        Mat4([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, z_far * range_reciprocal, -1.0],
            [0.0, 0.0, z_far * z_near * range_reciprocal, 0.0],
        ])
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let f = (target - eye).normalize();
        let s = f.cross(&up).normalize();
        let u = s.cross(&f);

        Mat4([
            [s.x(), u.x(), -f.x(), 0.0],
            [s.y(), u.y(), -f.y(), 0.0],
            [s.z(), u.z(), -f.z(), 0.0],
            [-s.dot(&eye), -u.dot(&eye), f.dot(&eye), 1.0],
        ])
    }

    pub fn translation(tx: f32, ty: f32, tz: f32) -> Mat4 {
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [tx, ty, tz, 1.0],
        ])
    }

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about +Y. A yaw of `atan2(d.x, d.z)` turns local +Z onto `d`.
    pub fn rotation_y(angle_in_radians: f32) -> Mat4 {
        let c = angle_in_radians.cos();
        let s = angle_in_radians.sin();
        Mat4([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn multiply(&self, b: &Mat4) -> Mat4 {
        let mut result = [[0.0; 4]; 4];
        for (i, column) in result.iter_mut().enumerate() {
            for (j, cell) in column.iter_mut().enumerate() {
                *cell = (0..4).map(|k| b.0[i][k] * self.0[k][j]).sum();
            }
        }
        Mat4(result)
    }

    /// Transforms a point (w = 1) and applies the perspective divide when `w != 1`.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.0;
        let x = m[0][0] * p.x() + m[1][0] * p.y() + m[2][0] * p.z() + m[3][0];
        let y = m[0][1] * p.x() + m[1][1] * p.y() + m[2][1] * p.z() + m[3][1];
        let z = m[0][2] * p.x() + m[1][2] * p.y() + m[2][2] * p.z() + m[3][2];
        let w = m[0][3] * p.x() + m[1][3] * p.y() + m[2][3] * p.z() + m[3][3];
        if w != 0.0 && w != 1.0 {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }
}

impl From<[[f32; 4]; 4]> for Mat4 {
    fn from(matrix: [[f32; 4]; 4]) -> Self {
        Mat4(matrix)
    }
}

impl From<Mat4> for [[f32; 4]; 4] {
    fn from(matrix: Mat4) -> Self {
        matrix.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Translation applied after scaling must move the scaled point.
    #[test]
    fn test_multiply_applies_right_operand_first() {
        let m = Mat4::translation(1.0, 2.0, 3.0).multiply(&Mat4::scaling(2.0, 2.0, 2.0));
        let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(p.x(), 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y(), 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z(), 5.0, epsilon = 1e-6);
    }

    /// The look-at target lands on the view-space -Z axis.
    #[test]
    fn test_look_at_puts_target_in_front() {
        let view = Mat4::look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 2.0, 0.0), Vec3::UP);
        let p = view.transform_point(Vec3::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(p.x(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z(), -5.0, epsilon = 1e-5);
    }

    /// Near and far planes map to depth 0 and 1.
    #[test]
    fn test_perspective_depth_range() {
        let proj = Mat4::perspective(1.0, 1.5, 0.1, 100.0);
        let near = proj.transform_point(Vec3::new(0.0, 0.0, -0.1));
        let far = proj.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert_abs_diff_eq!(near.z(), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(far.z(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_y_turns_forward_onto_heading() {
        let heading = 1.0_f32.atan2(0.0);
        let p = Mat4::rotation_y(heading).transform_point(Vec3::new(0.0, 0.0, 1.0));
        assert_abs_diff_eq!(p.x(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z(), 0.0, epsilon = 1e-6);
    }
}
