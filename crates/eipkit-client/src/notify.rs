//! Change notification for tag values.
//!
//! Hooks run on their own detached thread, after the tag lock is released.
//! Delivery order across changes is unspecified and a slow hook never blocks
//! the read that triggered it.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use tracing::warn;

use crate::tag::Tag;

/// A value change observed by a read.
#[derive(Debug, Clone)]
pub struct TagChange {
    pub tag: Tag,
    /// The new value bytes.
    pub value: Bytes,
}

pub type ChangeHook = Arc<dyn Fn(TagChange) + Send + Sync>;

pub(crate) fn spawn_hook(hook: ChangeHook, change: TagChange) {
    let spawned = thread::Builder::new()
        .name("eipkit-notify".into())
        .spawn(move || hook(change));
    if let Err(err) = spawned {
        warn!(error = %err, "failed to spawn change hook thread");
    }
}
