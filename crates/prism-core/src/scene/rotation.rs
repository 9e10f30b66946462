// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A rotation that can be read and written as either a quaternion or Euler angles.

use std::cell::Cell;

use crate::math::{Euler, EulerOrder, Quaternion};

/// Orientation of a [`Transform`](super::Transform).
///
/// Only the representation last written is authoritative. The other one is
/// derived on first read and cached until the next write, so the two never
/// notify each other.
#[derive(Debug, Clone)]
pub struct Rotation {
    quaternion: Cell<Option<Quaternion>>,
    euler: Cell<Option<Euler>>,
    order: EulerOrder,
}

impl Rotation {
    /// The identity rotation with the default `XYZ` order.
    pub fn identity() -> Self {
        Self::from_quaternion(Quaternion::IDENTITY)
    }

    /// Creates a rotation from a quaternion.
    pub fn from_quaternion(q: Quaternion) -> Self {
        Self {
            quaternion: Cell::new(Some(q)),
            euler: Cell::new(None),
            order: EulerOrder::default(),
        }
    }

    /// Creates a rotation from Euler angles. Their order becomes the rotation's order.
    pub fn from_euler(e: Euler) -> Self {
        Self {
            quaternion: Cell::new(None),
            euler: Cell::new(Some(e)),
            order: e.order,
        }
    }

    /// Returns the rotation as a quaternion.
    pub fn quaternion(&self) -> Quaternion {
        if let Some(q) = self.quaternion.get() {
            return q;
        }
        let q = self
            .euler
            .get()
            .map(|e| Quaternion::from_euler(&e))
            .unwrap_or(Quaternion::IDENTITY);
        self.quaternion.set(Some(q));
        q
    }

    /// Returns the rotation as Euler angles in [`Rotation::order`].
    pub fn euler(&self) -> Euler {
        if let Some(e) = self.euler.get() {
            return e;
        }
        let e = Euler::from_quaternion(self.quaternion(), self.order);
        self.euler.set(Some(e));
        e
    }

    /// The Euler order used when deriving angles.
    pub fn order(&self) -> EulerOrder {
        self.order
    }

    /// Overwrites the rotation with a quaternion.
    pub fn set_quaternion(&mut self, q: Quaternion) {
        self.quaternion.set(Some(q));
        self.euler.set(None);
    }

    /// Overwrites the rotation with Euler angles, adopting their order.
    pub fn set_euler(&mut self, e: Euler) {
        self.order = e.order;
        self.euler.set(Some(e));
        self.quaternion.set(None);
    }

    /// Changes the Euler order while keeping the same orientation.
    pub fn set_order(&mut self, order: EulerOrder) {
        if order == self.order {
            return;
        }
        let q = self.quaternion();
        self.order = order;
        self.set_quaternion(q);
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Rotation {
    /// Two rotations are equal when their quaternions are.
    fn eq(&self, other: &Self) -> bool {
        self.quaternion() == other.quaternion()
    }
}

impl From<Quaternion> for Rotation {
    fn from(q: Quaternion) -> Self {
        Self::from_quaternion(q)
    }
}

impl From<Euler> for Rotation {
    fn from(e: Euler) -> Self {
        Self::from_euler(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn euler_write_is_visible_as_quaternion() {
        let mut r = Rotation::identity();
        r.set_euler(Euler::new(0.0, 0.5, 0.0, EulerOrder::XYZ));
        let expected = Quaternion::from_axis_angle(Vec3::Y, 0.5);
        assert_relative_eq!(r.quaternion().dot(expected), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn quaternion_write_invalidates_cached_euler() {
        let mut r = Rotation::from_euler(Euler::new(0.2, 0.0, 0.0, EulerOrder::XYZ));
        assert_eq!(r.euler().x, 0.2);
        r.set_quaternion(Quaternion::from_axis_angle(Vec3::X, 0.7));
        assert_relative_eq!(r.euler().x, 0.7, epsilon = 1e-5);
    }

    #[test]
    fn changing_order_keeps_orientation() {
        let mut r = Rotation::from_euler(Euler::new(0.3, 0.4, 0.5, EulerOrder::XYZ));
        let before = r.quaternion();
        r.set_order(EulerOrder::ZYX);
        assert_eq!(r.euler().order, EulerOrder::ZYX);
        let after = Quaternion::from_euler(&r.euler());
        assert_relative_eq!(before.dot(after).abs(), 1.0, epsilon = 1e-5);
    }
}
