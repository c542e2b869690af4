//! Owned mask render targets, recreated whenever the viewport size changes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a texture the stage can bind or render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

impl TargetId {
    /// A fresh identity, never handed out before in this process.
    pub fn next() -> Self {
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Pixel formats the mask pass needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// Single-channel half float.
    MaskColor,
    /// 24-bit depth.
    MaskDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: TargetFormat,
}

/// Creates backend textures for [`MaskTargets`].
pub trait TargetAllocator {
    type Target;

    fn create_target(&mut self, desc: &TargetDesc) -> Self::Target;
}

/// Identities and size of the current mask pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskHandles {
    pub color: TargetId,
    pub depth: TargetId,
    pub width: u32,
    pub height: u32,
}

struct MaskPair<T> {
    handles: MaskHandles,
    color: T,
    depth: T,
}

/// Exclusively owns the mask colour and depth targets.
pub struct MaskTargets<A: TargetAllocator> {
    allocator: A,
    pair: Option<MaskPair<A::Target>>,
}

impl<A: TargetAllocator> MaskTargets<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            pair: None,
        }
    }

    /// Return the pair sized to `width` x `height`, recreating both targets if
    /// either dimension differs from the current pair.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> MaskHandles {
        if let Some(pair) = &self.pair {
            if pair.handles.width == width && pair.handles.height == height {
                return pair.handles;
            }
        }

        log::debug!("Creating ocean mask targets {}x{}", width, height);
        let color = self.allocator.create_target(&TargetDesc {
            label: "Ocean Mask",
            width,
            height,
            format: TargetFormat::MaskColor,
        });
        let depth = self.allocator.create_target(&TargetDesc {
            label: "Ocean Mask Depth",
            width,
            height,
            format: TargetFormat::MaskDepth,
        });
        let handles = MaskHandles {
            color: TargetId::next(),
            depth: TargetId::next(),
            width,
            height,
        };
        self.pair = Some(MaskPair {
            handles,
            color,
            depth,
        });
        handles
    }

    /// Look up a backend target by identity.
    pub fn target(&self, id: TargetId) -> Option<&A::Target> {
        let pair = self.pair.as_ref()?;
        if id == pair.handles.color {
            Some(&pair.color)
        } else if id == pair.handles.depth {
            Some(&pair.depth)
        } else {
            None
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every descriptor it is asked to create.
    #[derive(Default)]
    pub(crate) struct CountingAllocator {
        pub created: Vec<TargetDesc>,
    }

    impl TargetAllocator for CountingAllocator {
        type Target = TargetDesc;

        fn create_target(&mut self, desc: &TargetDesc) -> TargetDesc {
            self.created.push(*desc);
            *desc
        }
    }

    #[test]
    fn targets_are_reused_until_viewport_changes() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let a = targets.ensure_size(800, 600);
        let b = targets.ensure_size(800, 600);
        let c = targets.ensure_size(1024, 768);

        assert_eq!(a, b);
        assert_ne!(a.color, c.color);
        assert_ne!(a.depth, c.depth);
        assert_eq!((c.width, c.height), (1024, 768));
        assert_eq!(targets.allocator().created.len(), 4);

        let color = targets.target(c.color).unwrap();
        assert_eq!((color.width, color.height), (1024, 768));
        assert_eq!(color.format, TargetFormat::MaskColor);
        assert_eq!(targets.target(c.depth).unwrap().format, TargetFormat::MaskDepth);
    }

    /// A change in one dimension is enough to recreate both targets.
    #[test]
    fn single_dimension_change_recreates_pair() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let a = targets.ensure_size(800, 600);
        let b = targets.ensure_size(800, 601);
        assert_ne!(a.color, b.color);
        assert_ne!(a.depth, b.depth);
    }

    #[test]
    fn stale_identities_no_longer_resolve() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let old = targets.ensure_size(64, 64);
        let new = targets.ensure_size(128, 128);
        assert!(targets.target(old.color).is_none());
        assert_eq!(targets.target(new.depth).unwrap().format, TargetFormat::MaskDepth);
    }
}
