use glam::Vec2;

use crate::FixedPoint;

/// A map coordinate pair in 16.16 fixed point
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedVertex {
    pub x: FixedPoint,
    pub y: FixedPoint,
}

impl FixedVertex {
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }

    /// Build from whole map units, as stored in a `VERTEXES` lump
    pub const fn from_map_units(x: i16, y: i16) -> Self {
        Self {
            x: FixedPoint::from_int(x as i32),
            y: FixedPoint::from_int(y as i32),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.into(), self.y.into())
    }

    /// Length of the vector from `self` to `other`
    pub fn distance(self, other: FixedVertex) -> FixedPoint {
        FixedPoint::from((other.to_vec2() - self.to_vec2()).length())
    }
}

#[cfg(test)]
mod tests {
    use super::FixedVertex;
    use crate::FixedPoint;

    #[test]
    fn distance_along_diagonal() {
        let a = FixedVertex::from_map_units(0, 0);
        let b = FixedVertex::from_map_units(3, 4);
        assert_eq!(a.distance(b), FixedPoint::from_int(5));
        assert_eq!(b.to_vec2(), glam::Vec2::new(3.0, 4.0));
    }
}
