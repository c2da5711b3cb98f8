/// Clamps `value` into `[lo, hi]`. Argument order follows the effect docs: `clamp(-1.0, x, 1.0)`.
#[inline(always)]
pub(crate) fn clamp(lo: f32, value: f32, hi: f32) -> f32 {
    lo.max(value.min(hi))
}

const DEGENERATE_EPSILON: f32 = 1e-6;

/// A row-major 3×3 matrix used for projective warps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    pub fn determinant(&self) -> f32 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Returns `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < DEGENERATE_EPSILON {
            return None;
        }
        let m = &self.0;
        let inv_det = 1.0 / det;
        Some(Mat3([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ]))
    }

    pub fn mul(&self, other: &Mat3) -> Mat3 {
        let mut out = [[0.0; 3]; 3];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[row][k] * other.0[k][col]).sum();
            }
        }
        Mat3(out)
    }

    /// Applies the projective map to a 2D point.
    pub fn transform_point(&self, point: [f32; 2]) -> [f32; 2] {
        let m = &self.0;
        let x = m[0][0] * point[0] + m[0][1] * point[1] + m[0][2];
        let y = m[1][0] * point[0] + m[1][1] * point[1] + m[1][2];
        let w = m[2][0] * point[0] + m[2][1] * point[1] + m[2][2];
        [x / w, y / w]
    }

    /// Flattens to the column-major order expected by a `mat3x3<f32>` uniform.
    pub fn to_column_major(&self) -> [f32; 9] {
        let m = &self.0;
        [
            m[0][0], m[1][0], m[2][0], m[0][1], m[1][1], m[2][1], m[0][2], m[1][2], m[2][2],
        ]
    }
}

/// Projective map taking the unit square onto a quad.
///
/// Corners are in cyclic order: `(0,0)`, `(1,0)`, `(1,1)`, `(0,1)` land on
/// `quad[0]`, `quad[1]`, `quad[2]`, `quad[3]`. Returns `None` when three or more
/// corners are collinear.
pub fn square_to_quad(quad: [[f32; 2]; 4]) -> Option<Mat3> {
    let [[x0, y0], [x1, y1], [x2, y2], [x3, y3]] = quad;
    let dx1 = x1 - x2;
    let dy1 = y1 - y2;
    let dx2 = x3 - x2;
    let dy2 = y3 - y2;
    let dx3 = x0 - x1 + x2 - x3;
    let dy3 = y0 - y1 + y2 - y3;
    let det = dx1 * dy2 - dx2 * dy1;
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let a = (dx3 * dy2 - dx2 * dy3) / det;
    let b = (dx1 * dy3 - dx3 * dy1) / det;
    let map = Mat3([
        [x1 - x0 + a * x1, x3 - x0 + b * x3, x0],
        [y1 - y0 + a * y1, y3 - y0 + b * y3, y0],
        [a, b, 1.0],
    ]);
    map.inverse().map(|_| map)
}
