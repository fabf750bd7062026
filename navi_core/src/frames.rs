// navi_core/src/frames.rs

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use tracing::error;

use crate::types::{FrameId, TfProvider, Timestamp};

/// A pose tagged with the frame it is expressed in and the time it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPose {
    pub frame_id: FrameId,
    pub stamp: Timestamp,
    pub pose: Isometry3<f64>,
}

impl StampedPose {
    pub fn new(frame_id: impl Into<FrameId>, stamp: Timestamp, pose: Isometry3<f64>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            pose,
        }
    }

    /// A pose at `(x, y, z)` with identity orientation.
    pub fn from_xyz(frame_id: impl Into<FrameId>, stamp: Timestamp, x: f64, y: f64, z: f64) -> Self {
        Self::new(
            frame_id,
            stamp,
            Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity()),
        )
    }

    pub fn position(&self) -> Vector3<f64> {
        self.pose.translation.vector
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation
    }
}

// =========================================================================
// == Frame Transform Adapter ==
// =========================================================================

/// Re-expresses `pose` (given in `from`) in the `to` frame using the transform valid at `stamp`.
///
/// A failed lookup is not fatal: the error is logged and the identity transform is
/// used instead, so the caller may receive the pose unchanged.
pub fn transform(
    pose: &Isometry3<f64>,
    from: &FrameId,
    to: &FrameId,
    stamp: Timestamp,
    tf: &dyn TfProvider,
) -> Isometry3<f64> {
    if from == to {
        return *pose;
    }

    match tf.lookup_transform(to, from, stamp) {
        Ok(to_from) => to_from * pose,
        Err(e) => {
            error!(from = %from, to = %to, "transform lookup failed: {}", e);
            *pose
        }
    }
}

/// Convenience wrapper around [`transform`] for stamped poses. The result carries
/// the target frame and the original stamp.
pub fn transform_pose(pose: &StampedPose, to: &FrameId, tf: &dyn TfProvider) -> StampedPose {
    StampedPose {
        frame_id: to.clone(),
        stamp: pose.stamp,
        pose: transform(&pose.pose, &pose.frame_id, to, pose.stamp, tf),
    }
}
