/// World-space position or offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dist(self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Mean of a non-empty position set; `None` when empty.
    pub fn centroid<I: IntoIterator<Item = Vec3>>(positions: I) -> Option<Vec3> {
        let mut sum = Vec3::default();
        let mut n = 0usize;
        for p in positions {
            sum = sum.add(p);
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let n = n as f64;
        Some(Vec3::new(sum.x / n, sum.y / n, sum.z / n))
    }

    /// Quantized key at 0.1-unit resolution, for deduplicating coincident
    /// endpoints.
    pub fn rounded_key(self) -> (i64, i64, i64) {
        (
            (self.x * 10.0).round() as i64,
            (self.y * 10.0).round() as i64,
            (self.z * 10.0).round() as i64,
        )
    }
}

/// Unit quaternion in (x, y, z, w) component order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotate a vector by this quaternion.
    ///
    /// Hamilton vector-rotation identity: `v + w*t + cross(q, t)` where
    /// `t = 2 * cross(q, v)`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let tx = 2.0 * (self.y * v.z - self.z * v.y);
        let ty = 2.0 * (self.z * v.x - self.x * v.z);
        let tz = 2.0 * (self.x * v.y - self.y * v.x);
        Vec3::new(
            v.x + self.w * tx + (self.y * tz - self.z * ty),
            v.y + self.w * ty + (self.z * tx - self.x * tz),
            v.z + self.w * tz + (self.x * ty - self.y * tx),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) {
        assert!(a.dist(b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn identity_rotation_is_noop() {
        let v = Vec3::new(1.5, -2.0, 3.25);
        approx(Quat::IDENTITY.rotate(v), v);
    }

    #[test]
    fn quarter_turn_about_z() {
        // 90 degrees about +Z maps +X to +Y.
        let half = std::f64::consts::FRAC_PI_4;
        let q = Quat::new(0.0, 0.0, half.sin(), half.cos());
        approx(q.rotate(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn centroid_of_positions() {
        let c = Vec3::centroid([Vec3::new(0.0, 0.0, 2.0), Vec3::new(10.0, 4.0, 4.0)]).unwrap();
        approx(c, Vec3::new(5.0, 2.0, 3.0));
        assert!(Vec3::centroid([]).is_none());
    }

    #[test]
    fn rounded_key_merges_coincident_points() {
        let a = Vec3::new(1.04, 2.0, 3.0);
        let b = Vec3::new(1.01, 2.0, 3.0);
        let c = Vec3::new(1.26, 2.0, 3.0);
        assert_eq!(a.rounded_key(), b.rounded_key());
        assert_ne!(a.rounded_key(), c.rounded_key());
    }
}
