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

//! Euler angles with an explicit rotation order.

use serde::{Deserialize, Serialize};

use super::{clamp, Mat3, Quaternion};

/// Beyond this absolute sine the middle axis is treated as gimbal-locked.
const GIMBAL_LOCK_THRESHOLD: f32 = 0.99999;

/// The order in which the three axis rotations are composed.
///
/// `XYZ` means the matrix is `Rx * Ry * Rz`, so the Z rotation is applied to the
/// vector first.
#[allow(missing_docs, clippy::upper_case_acronyms)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EulerOrder {
    #[default]
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

/// Three rotation angles in radians plus the order they are applied in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    /// Rotation around the X axis.
    pub x: f32,
    /// Rotation around the Y axis.
    pub y: f32,
    /// Rotation around the Z axis.
    pub z: f32,
    /// Composition order.
    pub order: EulerOrder,
}

impl Euler {
    /// Creates a new set of Euler angles.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Extracts Euler angles in `order` from a pure rotation matrix.
    ///
    /// The `asin` argument is clamped to `[-1, 1]`. Near gimbal lock the third
    /// angle is pinned to zero and the remaining one is recovered with `atan2`.
    pub fn from_rotation_matrix(m: &Mat3, order: EulerOrder) -> Self {
        let [c0, c1, c2] = m.cols;
        // Row/column naming: mRC.
        let (m11, m21, m31) = (c0.x, c0.y, c0.z);
        let (m12, m22, m32) = (c1.x, c1.y, c1.z);
        let (m13, m23, m33) = (c2.x, c2.y, c2.z);

        let (x, y, z) = match order {
            EulerOrder::XYZ => {
                let y = clamp(m13, -1.0, 1.0).asin();
                if m13.abs() < GIMBAL_LOCK_THRESHOLD {
                    ((-m23).atan2(m33), y, (-m12).atan2(m11))
                } else {
                    (m32.atan2(m22), y, 0.0)
                }
            }
            EulerOrder::YXZ => {
                let x = (-clamp(m23, -1.0, 1.0)).asin();
                if m23.abs() < GIMBAL_LOCK_THRESHOLD {
                    (x, m13.atan2(m33), m21.atan2(m22))
                } else {
                    (x, (-m31).atan2(m11), 0.0)
                }
            }
            EulerOrder::ZXY => {
                let x = clamp(m32, -1.0, 1.0).asin();
                if m32.abs() < GIMBAL_LOCK_THRESHOLD {
                    (x, (-m31).atan2(m33), (-m12).atan2(m22))
                } else {
                    (x, 0.0, m21.atan2(m11))
                }
            }
            EulerOrder::ZYX => {
                let y = (-clamp(m31, -1.0, 1.0)).asin();
                if m31.abs() < GIMBAL_LOCK_THRESHOLD {
                    (m32.atan2(m33), y, m21.atan2(m11))
                } else {
                    (0.0, y, (-m12).atan2(m22))
                }
            }
            EulerOrder::YZX => {
                let z = clamp(m21, -1.0, 1.0).asin();
                if m21.abs() < GIMBAL_LOCK_THRESHOLD {
                    ((-m23).atan2(m22), (-m31).atan2(m11), z)
                } else {
                    (0.0, m13.atan2(m33), z)
                }
            }
            EulerOrder::XZY => {
                let z = (-clamp(m12, -1.0, 1.0)).asin();
                if m12.abs() < GIMBAL_LOCK_THRESHOLD {
                    (m32.atan2(m22), m13.atan2(m11), z)
                } else {
                    ((-m23).atan2(m33), 0.0, z)
                }
            }
        };

        Self::new(x, y, z, order)
    }

    /// Converts a unit quaternion into Euler angles in `order`.
    #[inline]
    pub fn from_quaternion(q: Quaternion, order: EulerOrder) -> Self {
        Self::from_rotation_matrix(&Mat3::from_quat(q), order)
    }

    /// Returns the equivalent quaternion.
    #[inline]
    pub fn to_quaternion(&self) -> Quaternion {
        Quaternion::from_euler(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec3, FRAC_PI_2};
    use approx::assert_relative_eq;

    const ORDERS: [EulerOrder; 6] = [
        EulerOrder::XYZ,
        EulerOrder::XZY,
        EulerOrder::YXZ,
        EulerOrder::YZX,
        EulerOrder::ZXY,
        EulerOrder::ZYX,
    ];

    #[test]
    fn test_round_trip_every_order() {
        for order in ORDERS {
            let e = Euler::new(0.4, -0.9, 1.3, order);
            let back = Euler::from_quaternion(e.to_quaternion(), order);
            assert_relative_eq!(back.x, e.x, epsilon = 1e-4);
            assert_relative_eq!(back.y, e.y, epsilon = 1e-4);
            assert_relative_eq!(back.z, e.z, epsilon = 1e-4);
            assert_eq!(back.order, order);
        }
    }

    #[test]
    fn test_gimbal_lock_stays_finite_and_equivalent() {
        for order in ORDERS {
            // A quarter turn on the middle axis of every order.
            let mut e = Euler::new(0.3, 0.3, 0.3, order);
            match order {
                EulerOrder::XYZ | EulerOrder::ZYX => e.y = FRAC_PI_2,
                EulerOrder::YXZ | EulerOrder::ZXY => e.x = FRAC_PI_2,
                EulerOrder::XZY | EulerOrder::YZX => e.z = FRAC_PI_2,
            }
            let q = e.to_quaternion();
            let back = Euler::from_quaternion(q, order);
            assert!(back.x.is_finite() && back.y.is_finite() && back.z.is_finite());
            let v = Vec3::new(0.2, 0.5, -0.8);
            assert!((back.to_quaternion() * v).distance(q * v) < 1e-2, "{:?}", order);
        }
    }

    #[test]
    fn test_clamps_out_of_range_sine() {
        let mut m = Mat3::IDENTITY;
        m.cols[2].x = 1.0000001;
        let e = Euler::from_rotation_matrix(&m, EulerOrder::XYZ);
        assert!(e.y.is_finite());
    }
}
