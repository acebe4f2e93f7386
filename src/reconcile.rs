//! Reconciliation of the local quote list against a remote one.
//!
//! This module handles:
//! - Classifying remote records as conflicts or new items
//! - Resolving conflicts (keep server, keep local, or keep both)
//! - Applying the resulting patch to a quote list

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::models::{Conflict, Quote, QuoteId};

/// How to resolve a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Overwrite the local record with the server version
    Server,
    /// Keep the local record untouched
    Local,
    /// Keep the local record under a new id and append the server version
    Both,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::Server => "server",
            ResolutionPolicy::Local => "local",
            ResolutionPolicy::Both => "both",
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" | "remote" | "keep_remote" => Ok(ResolutionPolicy::Server),
            "local" | "keep_local" => Ok(ResolutionPolicy::Local),
            "both" | "keep_both" => Ok(ResolutionPolicy::Both),
            other => Err(QuoteError::validation(
                "policy",
                format!("unknown resolution policy '{}'", other),
            )),
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing a local and a remote list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub conflicts: Vec<Conflict>,
    pub new_items: Vec<Quote>,
}

impl Diff {
    /// True when the lists are already in sync
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.new_items.is_empty()
    }
}

/// Compare the local list against a remote one.
///
/// A remote record sharing an id with a local record is a conflict when text
/// or category differ and is dropped otherwise. Remote records with no local
/// match, including those without an id, are new items. Each remote id is
/// classified once per batch.
pub fn diff(local: &[Quote], remote: &[Quote]) -> Diff {
    let local_by_id: HashMap<&QuoteId, &Quote> = local
        .iter()
        .filter_map(|q| q.id.as_ref().map(|id| (id, q)))
        .collect();

    let mut seen: HashSet<&QuoteId> = HashSet::new();
    let mut result = Diff::default();

    for server in remote {
        let Some(id) = server.id.as_ref() else {
            result.new_items.push(server.clone());
            continue;
        };

        if !seen.insert(id) {
            tracing::debug!("Ignoring repeated remote id {}", id);
            continue;
        }

        match local_by_id.get(id) {
            Some(local) if local.same_content(server) => {}
            Some(local) => {
                result
                    .conflicts
                    .push(Conflict::new(id.clone(), (*local).clone(), server.clone()));
            }
            None => result.new_items.push(server.clone()),
        }
    }

    tracing::debug!(
        "Diffed {} local against {} remote: {} conflicts, {} new",
        local.len(),
        remote.len(),
        result.conflicts.len(),
        result.new_items.len()
    );

    result
}

/// Changes to apply to a quote list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// Records replacing the local record with the same id
    pub replacements: Vec<Quote>,
    /// Local records moved from the first id to the second
    pub reassigned: Vec<(QuoteId, QuoteId)>,
    /// Records appended to the end of the list
    pub appended: Vec<Quote>,
}

impl Patch {
    /// Patch appending every new item from a diff
    pub fn from_new_items(new_items: Vec<Quote>) -> Self {
        Self {
            appended: new_items,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty() && self.reassigned.is_empty() && self.appended.is_empty()
    }

    /// Merge another patch into this one
    pub fn extend(&mut self, other: Patch) {
        self.replacements.extend(other.replacements);
        self.reassigned.extend(other.reassigned);
        self.appended.extend(other.appended);
    }

    /// Apply the patch in place, returning how many records changed.
    ///
    /// Reassignments run before appends so an appended record can take over
    /// an id released in the same patch. Replacements and reassignments whose
    /// id is no longer present in the list are skipped.
    pub fn apply(self, list: &mut Vec<Quote>) -> usize {
        let mut changed = 0;

        for replacement in self.replacements {
            let Some(id) = replacement.id.as_ref() else {
                continue;
            };
            match list.iter_mut().find(|q| q.id.as_ref() == Some(id)) {
                Some(existing) => {
                    *existing = replacement;
                    changed += 1;
                }
                None => tracing::warn!("Replacement target {} no longer exists", id),
            }
        }

        for (from, to) in self.reassigned {
            match list.iter_mut().find(|q| q.id.as_ref() == Some(&from)) {
                Some(existing) => {
                    existing.id = Some(to);
                    changed += 1;
                }
                None => tracing::warn!("Reassignment target {} no longer exists", from),
            }
        }

        changed += self.appended.len();
        list.extend(self.appended);
        changed
    }
}

/// Turn conflicts into a patch according to `policy`.
///
/// `Both` keeps the local version under a freshly minted local id and
/// appends the server version under the remote id, so the next diff sees the
/// remote record in sync and does not fork it again.
pub fn resolve(conflicts: &[Conflict], policy: ResolutionPolicy) -> Patch {
    let mut patch = Patch::default();

    for conflict in conflicts {
        match policy {
            ResolutionPolicy::Server => patch.replacements.push(conflict.server.clone()),
            ResolutionPolicy::Local => {}
            ResolutionPolicy::Both => {
                patch
                    .reassigned
                    .push((conflict.id.clone(), QuoteId::new_local()));
                let mut fork = conflict.server.clone();
                fork.id = Some(conflict.id.clone());
                patch.appended.push(fork);
            }
        }
    }

    patch
}
