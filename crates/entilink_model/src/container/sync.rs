//! Four-pass reconciliation of a response container into a local one.

use crate::container::Container;
use crate::entity::{Entity, Message};
use crate::error::{ModelError, ModelResult};
use tracing::{debug, trace};

/// Options controlling the synchronization algorithm.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Reject ambiguous matches instead of leaving them to the append
    /// pass (the `uniquename` transaction option).
    pub unique: bool,
    /// Raise immediately on an ambiguous match. When false, the ambiguity
    /// message is still attached and the sync completes.
    pub raise_on_ambiguity: bool,
    /// Match names case-sensitively in the name pass.
    pub name_case_sensitive: bool,
}

impl SyncOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the uniqueness policy.
    #[must_use]
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets whether ambiguous matches raise immediately.
    #[must_use]
    pub fn with_raise_on_ambiguity(mut self, raise: bool) -> Self {
        self.raise_on_ambiguity = raise;
        self
    }

    /// Sets case-sensitive name matching.
    #[must_use]
    pub fn with_name_case_sensitive(mut self, sensitive: bool) -> Self {
        self.name_case_sensitive = sensitive;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            unique: false,
            raise_on_ambiguity: true,
            name_case_sensitive: false,
        }
    }
}

/// Counters describing what a sync did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local entities overwritten from a matching remote entity.
    pub matched: usize,
    /// Remote entities appended because no local entity matched.
    pub appended: usize,
    /// Local entities flagged ambiguous under the uniqueness policy.
    pub ambiguous: usize,
}

/// The matching passes, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Cuid,
    Id,
    Path,
    Name,
}

impl Pass {
    const ALL: [Pass; 4] = [Pass::Cuid, Pass::Id, Pass::Path, Pass::Name];

    fn matches(self, local: &Entity, remote: &Entity, opts: &SyncOptions) -> bool {
        match self {
            Pass::Cuid => match (local.cuid(), remote.cuid()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Pass::Id => match (local.id(), remote.id()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Pass::Path => match (local.path(), remote.path()) {
                (Some(a), Some(b)) => normalize_path(a) == normalize_path(b),
                _ => false,
            },
            Pass::Name => match (local.name(), remote.name()) {
                (Some(a), Some(b)) => {
                    if opts.name_case_sensitive {
                        a == b
                    } else {
                        a.eq_ignore_ascii_case(b)
                    }
                }
                _ => false,
            },
        }
    }
}

/// Paths compare equal regardless of one leading separator.
fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

impl Container {
    /// Merges a response container into this one.
    ///
    /// Local entities are matched against remote entities in four passes
    /// (cuid, id, path, name); each pass only considers local entities not
    /// yet matched and remote entities not yet consumed. A unique match
    /// overwrites the local entity with remote truth. Remote entities left
    /// unconsumed are appended. Container-level messages and the
    /// `timestamp`/`srid` metadata are copied from the response.
    pub fn sync_with(
        &mut self,
        remote: Container,
        opts: &SyncOptions,
    ) -> ModelResult<SyncReport> {
        let Container {
            entities: remote_entities,
            messages: remote_messages,
            timestamp,
            srid,
        } = remote;

        let mut slots: Vec<Option<Entity>> = remote_entities.into_iter().map(Some).collect();
        let mut handled = vec![false; self.len()];
        let mut report = SyncReport::default();

        for pass in Pass::ALL {
            for (li, local) in self.iter_mut().enumerate() {
                if handled[li] {
                    continue;
                }
                let candidates: Vec<usize> = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| {
                        slot.as_ref()
                            .is_some_and(|r| pass.matches(local, r, opts))
                    })
                    .map(|(ri, _)| ri)
                    .collect();

                match candidates.len() {
                    0 => {}
                    1 => {
                        let remote = slots[candidates[0]].take().unwrap_or_default();
                        trace!(pass = ?pass, index = li, "matched local entity");
                        local.adopt(remote);
                        handled[li] = true;
                        report.matched += 1;
                    }
                    n if opts.unique => {
                        let label = entity_label(local);
                        local.add_message(Message::error(
                            None,
                            format!("request was ambiguous: {n} remote entities match"),
                        ));
                        handled[li] = true;
                        report.ambiguous += 1;
                        if opts.raise_on_ambiguity {
                            return Err(ModelError::ambiguous_match(label, n));
                        }
                    }
                    _ => {
                        // Without the uniqueness policy the local entity
                        // stays as it is; the candidates are appended below.
                    }
                }
            }
        }

        for slot in slots {
            if let Some(remote) = slot {
                self.push(remote);
                report.appended += 1;
            }
        }

        for message in &remote_messages {
            self.messages.set(message.clone());
        }
        self.timestamp = timestamp;
        self.srid = srid;

        debug!(
            matched = report.matched,
            appended = report.appended,
            ambiguous = report.ambiguous,
            "synchronized response container"
        );
        Ok(report)
    }
}

fn entity_label(entity: &Entity) -> String {
    entity
        .name()
        .map(str::to_string)
        .or_else(|| entity.path().map(str::to_string))
        .or_else(|| entity.id().map(|id| id.to_string()))
        .unwrap_or_else(|| "<unnamed>".into())
}
