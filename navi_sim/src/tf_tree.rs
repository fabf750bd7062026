// navi_sim/src/tf_tree.rs

use nalgebra::Isometry3;
use std::collections::HashMap;

use navi_core::prelude::{FrameId, TfError, TfProvider, Timestamp};

use crate::config::FrameConfig;
use crate::error::SimError;

// =========================================================================
// == TF Tree Infrastructure (The "Service") ==
// =========================================================================

#[derive(Debug, Clone)]
struct ResolvedFrame {
    /// Pose of the frame in its root frame.
    pose_in_root: Isometry3<f64>,
    root: FrameId,
}

/// A static transform tree built once from the scenario's frame list.
#[derive(Debug, Clone, Default)]
pub struct StaticTfTree {
    frames: HashMap<FrameId, ResolvedFrame>,
}

impl StaticTfTree {
    /// Resolves every frame's pose against its root. Fails on unknown parents,
    /// duplicate names or cycles.
    pub fn from_frames(frames: &[FrameConfig]) -> Result<Self, SimError> {
        let mut by_name: HashMap<&FrameId, &FrameConfig> = HashMap::with_capacity(frames.len());
        for frame in frames {
            if by_name.insert(&frame.name, frame).is_some() {
                return Err(SimError::Scenario(format!(
                    "frame '{}' is defined twice",
                    frame.name
                )));
            }
        }

        let mut tree = Self::default();
        for frame in frames {
            let resolved = Self::resolve(frame, &by_name)?;
            tree.frames.insert(frame.name.clone(), resolved);
        }
        Ok(tree)
    }

    /// Walks up to the root, composing parent poses on the way.
    fn resolve<'a>(
        frame: &'a FrameConfig,
        by_name: &HashMap<&'a FrameId, &'a FrameConfig>,
    ) -> Result<ResolvedFrame, SimError> {
        let mut pose = frame.pose_in_parent();
        let mut current = frame;
        let mut hops = 0;

        while let Some(parent_name) = &current.parent {
            hops += 1;
            if hops > by_name.len() {
                return Err(SimError::Scenario(format!(
                    "frame '{}' is part of a cycle",
                    frame.name
                )));
            }
            let parent = by_name
                .get(parent_name)
                .copied()
                .ok_or_else(|| TfError::UnknownFrame(parent_name.clone()))?;
            pose = parent.pose_in_parent() * pose;
            current = parent;
        }

        Ok(ResolvedFrame {
            pose_in_root: pose,
            root: current.name.clone(),
        })
    }

    pub fn contains(&self, frame: &FrameId) -> bool {
        self.frames.contains_key(frame)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl TfProvider for StaticTfTree {
    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        _stamp: Timestamp,
    ) -> Result<Isometry3<f64>, TfError> {
        let target_frame = self
            .frames
            .get(target)
            .ok_or_else(|| TfError::UnknownFrame(target.clone()))?;
        let source_frame = self
            .frames
            .get(source)
            .ok_or_else(|| TfError::UnknownFrame(source.clone()))?;

        if target_frame.root != source_frame.root {
            return Err(TfError::Disconnected {
                target: target.clone(),
                origin: source.clone(),
            });
        }

        // T_target_source = (T_root_target)^-1 * T_root_source
        Ok(target_frame.pose_in_root.inverse() * source_frame.pose_in_root)
    }
}
