//! Hand orientation for a top-down grasp

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use super::HAND_TILT_DEG;
use crate::eqpt::{AxisAngle, HandSide};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Orientation of the hand frame in the root frame for grasping an object from above with the
/// given hand.
///
/// The palm faces down with the hand x axis along root -x, then the hand is rotated by
/// [`HAND_TILT_DEG`] about the root -y axis.
pub fn compute_hand_orientation(side: HandSide) -> AxisAngle {
    AxisAngle::from_rotation(&hand_rotation(side))
}

/// Rotation matrix form of [`compute_hand_orientation`].
pub(crate) fn hand_rotation(side: HandSide) -> Rotation3<f64> {
    let tilt = Rotation3::from_axis_angle(
        &Unit::new_normalize(-Vector3::y()),
        HAND_TILT_DEG.to_radians(),
    );

    tilt * palm_down(side)
}

/// Palm down. The palm normal is the hand's +y axis for the right hand and -y
/// for the left one.
fn palm_down(side: HandSide) -> Rotation3<f64> {
    let m = match side {
        HandSide::Right => Matrix3::new(
            -1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, //
            0.0, -1.0, 0.0,
        ),
        HandSide::Left => Matrix3::new(
            -1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, 1.0, 0.0,
        ),
    };

    Rotation3::from_matrix_unchecked(m)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_palm_down_is_rotation() {
        for &side in &HandSide::ALL {
            let m = palm_down(side).into_inner();
            assert!((m.determinant() - 1.0).abs() < 1e-12);
            assert!((m * m.transpose() - Matrix3::identity()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_palm_faces_down() {
        let tilt = HAND_TILT_DEG.to_radians();

        let right = hand_rotation(HandSide::Right) * Vector3::y();
        assert!((right.z + tilt.cos()).abs() < 1e-9);

        let left = hand_rotation(HandSide::Left) * -Vector3::y();
        assert!((left.z + tilt.cos()).abs() < 1e-9);

        // Hand x is root -x on both sides
        for &side in &HandSide::ALL {
            let x = palm_down(side) * Vector3::x();
            assert!((x + Vector3::x()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_tilt_angle() {
        for &side in &HandSide::ALL {
            let angle = hand_rotation(side).angle_to(&palm_down(side));
            assert!((angle - HAND_TILT_DEG.to_radians()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_axis_angle_matches_rotation() {
        for &side in &HandSide::ALL {
            let aa = compute_hand_orientation(side);
            assert!((aa.axis.norm() - 1.0).abs() < 1e-9);
            assert!(aa.to_rotation().angle_to(&hand_rotation(side)) < 1e-9);
        }
    }
}
