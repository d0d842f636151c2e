use std::collections::BTreeMap;
use std::sync::Mutex;

use bytes::Bytes;
use tracing::debug;

use crate::batch::exchange_batch;
use crate::error::{ClientError, Result};
use crate::notify::spawn_hook;
use crate::session::{lock, Session};
use crate::tag::Tag;

/// Tags read and written together, one Multiple Service Packet per
/// operation.
///
/// Members are keyed by instance id, so tags created by name (instance 0)
/// replace each other. The group lock is held for a whole batched exchange.
pub struct TagGroup {
    session: Session,
    tags: Mutex<BTreeMap<u32, Tag>>,
}

impl TagGroup {
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            tags: Mutex::new(BTreeMap::new()),
        }
    }

    /// Add `tag`. Tags bound to another session are ignored and `false` is
    /// returned.
    pub fn add(&self, tag: &Tag) -> bool {
        if !tag.session().same_session(&self.session) {
            return false;
        }
        lock(&self.tags).insert(tag.instance_id(), tag.clone());
        true
    }

    pub fn remove(&self, tag: &Tag) -> Option<Tag> {
        lock(&self.tags).remove(&tag.instance_id())
    }

    pub fn len(&self) -> usize {
        lock(&self.tags).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.tags).is_empty()
    }

    pub fn tags(&self) -> Vec<Tag> {
        lock(&self.tags).values().cloned().collect()
    }

    /// Read every member in one exchange.
    ///
    /// Successful sub-replies are applied even when others fail; the first
    /// failure is returned. Change hooks fire after every member is updated.
    pub fn read(&self) -> Result<()> {
        let tags = lock(&self.tags);
        let members: Vec<&Tag> = tags.values().collect();
        match members.as_slice() {
            [] => return Ok(()),
            [only] => return only.read(),
            _ => {}
        }

        let requests = members
            .iter()
            .map(|tag| tag.read_request())
            .collect::<Result<Vec<_>>>()?;
        let replies = exchange_batch(&self.session, requests)?;

        let mut hooks = Vec::new();
        let mut first_err: Option<ClientError> = None;
        for (tag, reply) in members.iter().zip(replies) {
            let applied = if reply.is_success() {
                tag.apply_read(&reply)
            } else {
                Err(reply.status_error().into())
            };
            match applied {
                Ok(Some(hook)) => hooks.push(hook),
                Ok(None) => {}
                Err(err) => {
                    debug!(tag = %tag.name(), error = %err, "group read member failed");
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }

        for (hook, change) in hooks {
            spawn_hook(hook, change);
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Write every member with a staged value in one exchange.
    ///
    /// On failure the contributing members stay marked as changed so the
    /// next group write retries them.
    pub fn write(&self) -> Result<()> {
        let tags = lock(&self.tags);

        let mut contributors: Vec<(&Tag, Bytes)> = Vec::new();
        let mut requests = Vec::new();
        for tag in tags.values() {
            if !tag.take_changed() {
                continue;
            }
            match tag.write_snapshot() {
                Ok(Some(snapshot)) => {
                    requests.extend(snapshot.requests);
                    contributors.push((tag, snapshot.value));
                }
                Ok(None) => {}
                Err(err) => {
                    tag.mark_changed();
                    remark(&contributors);
                    return Err(err);
                }
            }
        }
        if requests.is_empty() {
            return Ok(());
        }

        let sent = exchange_batch(&self.session, requests).and_then(|replies| -> Result<()> {
            for reply in replies {
                reply.check_status()?;
            }
            Ok(())
        });
        if let Err(err) = sent {
            remark(&contributors);
            return Err(err);
        }

        for (tag, value) in &contributors {
            tag.commit(value);
        }
        debug!(tags = contributors.len(), "group write committed");
        Ok(())
    }
}

fn remark(contributors: &[(&Tag, Bytes)]) {
    for (tag, _) in contributors {
        tag.mark_changed();
    }
}

impl std::fmt::Debug for TagGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagGroup")
            .field("tags", &self.len())
            .finish_non_exhaustive()
    }
}
