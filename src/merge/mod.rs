//! Overlaying translated content on the current target while honoring locks.

mod blocks;
mod locks;
mod metadata;

pub use blocks::apply_locks;
pub use locks::{BlockLock, LockedPaths, parse_block_path, render_block_path};
pub use metadata::{MetadataMap, MetadataMerge, apply_metadata_locks};
