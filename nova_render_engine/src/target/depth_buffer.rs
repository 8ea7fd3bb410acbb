/// Depth-buffer pool - pool-managed depth buffers attached to render
/// targets on demand
use crate::device::{DepthViewHandle, NativeDevice};
use crate::error::Result;
use crate::target::RenderTarget;
use rustc_hash::FxHashMap;

/// Identifier of a depth-buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthPoolId(pub u16);

impl DepthPoolId {
    /// Targets in this pool never get a depth buffer
    pub const NO_DEPTH: DepthPoolId = DepthPoolId(0);
    /// Default pool for automatically managed depth buffers
    pub const DEFAULT: DepthPoolId = DepthPoolId(1);
}

/// One pool-managed depth buffer
///
/// A weak view reference plus the geometry needed for compatibility checks;
/// the native object is owned by the device and dies with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBufferAttachment {
    /// Pool the buffer belongs to
    pub pool: DepthPoolId,
    /// Native depth/stencil view
    pub view: DepthViewHandle,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub sample_quality: u32,
    /// Added manually by a collaborator rather than created by the pool
    pub manual: bool,
}

impl DepthBufferAttachment {
    /// True when this buffer can serve `target`
    pub fn is_compatible(&self, target: &dyn RenderTarget) -> bool {
        self.width >= target.width()
            && self.height >= target.height()
            && self.samples == target.sample_count()
            && self.sample_quality == target.sample_quality()
    }
}

/// Mapping from pool identifier to the depth buffers living in it
///
/// Buffers are looked up by compatibility before new ones are created, and
/// by view identity before manual buffers are duplicated. The whole pool is
/// released on device loss; engine-level pool assignments stay on the
/// targets.
#[derive(Debug, Default)]
pub struct DepthBufferPool {
    pools: FxHashMap<DepthPoolId, Vec<DepthBufferAttachment>>,
}

impl DepthBufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `target` has a depth buffer when its pool demands one
    ///
    /// Looks for a compatible buffer in the target's pool first; only when
    /// none fits is a new one created through the device and added to the
    /// pool.
    pub fn attach_depth_buffer(
        &mut self,
        device: &mut dyn NativeDevice,
        target: &mut dyn RenderTarget,
    ) -> Result<()> {
        let pool_id = target.depth_buffer_pool();
        if pool_id == DepthPoolId::NO_DEPTH || target.depth_buffer().is_some() {
            return Ok(());
        }

        let pool = self.pools.entry(pool_id).or_default();
        if let Some(existing) = pool.iter().find(|b| b.is_compatible(target)) {
            target.attach_depth_buffer(*existing);
            return Ok(());
        }

        let view = device
            .create_depth_buffer(
                target.width(),
                target.height(),
                target.sample_count(),
                target.sample_quality(),
            )
            .map_err(|e| e.into_error("create depth buffer"))?;

        let buffer = DepthBufferAttachment {
            pool: pool_id,
            view,
            width: target.width(),
            height: target.height(),
            samples: target.sample_count(),
            sample_quality: target.sample_quality(),
            manual: false,
        };
        pool.push(buffer);
        target.attach_depth_buffer(buffer);
        Ok(())
    }

    /// Register an externally created depth buffer in the default pool
    ///
    /// If a buffer with the same view was already added, that one is
    /// returned instead of creating a duplicate entry.
    pub fn add_manual(
        &mut self,
        view: DepthViewHandle,
        width: u32,
        height: u32,
        samples: u32,
        sample_quality: u32,
    ) -> DepthBufferAttachment {
        let pool = self.pools.entry(DepthPoolId::DEFAULT).or_default();
        if let Some(existing) = pool.iter().find(|b| b.view == view) {
            return *existing;
        }

        let buffer = DepthBufferAttachment {
            pool: DepthPoolId::DEFAULT,
            view,
            width,
            height,
            samples,
            sample_quality,
            manual: true,
        };
        pool.push(buffer);
        buffer
    }

    /// Remove a manual depth buffer by view identity
    pub fn remove_manual(&mut self, view: DepthViewHandle) {
        for pool in self.pools.values_mut() {
            pool.retain(|b| !(b.manual && b.view == view));
        }
    }

    /// Buffers currently living in a pool
    pub fn buffers(&self, pool: DepthPoolId) -> &[DepthBufferAttachment] {
        self.pools.get(&pool).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total buffer count across pools
    pub fn len(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry (device loss); the native objects die with the
    /// device
    pub fn clear(&mut self) {
        self.pools.clear();
    }
}

#[cfg(test)]
#[path = "depth_buffer_tests.rs"]
mod tests;
