// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reference Resolver
//!
//! Second-pass resolution for citations that could not be satisfied while
//! their chunk was parsed or remapped, usually because the cited object
//! did not exist yet. Each entry remembers the citation site (owning object
//! and payload offset) and a strategy for finding the target: by raw ID, by
//! name scoped to a class, or by type GUID.
//!
//! [`ReferenceResolver::resolve_all`] iterates to a fixed point, patching
//! resolved runtime IDs directly into the owning chunks. Entries that never
//! resolve are counted; the load pipeline escalates them to a failure only
//! under `STRICT_REFERENCES`.

use crate::error::FormatError;
use crate::memory::BitArray;
use crate::repositories::{ObjectIndex, ObjectRepository};
use crate::services::ClassHierarchy;
use crate::value_objects::{ClassId, Guid, IdRemap, ObjectId};

/// How a pending citation finds its target object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// The raw ID read from the file, awaiting a late remap entry.
    ById(ObjectId),
    /// Lookup by object name, optionally scoped to a class (derivation-aware
    /// when a hierarchy collaborator is available).
    ByName { name: String, class_id: Option<ClassId> },
    /// Lookup by the object's type GUID.
    ByGuid(Guid),
}

/// One citation awaiting resolution.
#[derive(Debug, Clone)]
struct PendingReference {
    owner: ObjectId,
    site: u32,
    strategy: ResolutionStrategy,
}

/// Totals from a [`ReferenceResolver::resolve_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub resolved: usize,
    pub unresolved: usize,
}

/// Second-pass citation resolver.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    entries: Vec<PendingReference>,
    resolved: BitArray,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a citation site for later resolution.
    pub fn add(&mut self, owner: ObjectId, site: u32, strategy: ResolutionStrategy) {
        self.entries.push(PendingReference { owner, site, strategy });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still pending after the last `resolve_all`.
    pub fn unresolved_count(&self) -> usize {
        self.entries.len() - self.resolved.count_ones()
    }

    /// Resolves every pending entry it can, patching runtime IDs into the
    /// owning chunks, and iterates until no further entry makes progress.
    pub fn resolve_all(
        &mut self,
        repository: &mut ObjectRepository,
        index: &ObjectIndex,
        hierarchy: Option<&dyn ClassHierarchy>,
        remap: Option<&IdRemap>,
    ) -> Result<ResolveOutcome, FormatError> {
        loop {
            let mut progressed = false;

            for entry_index in 0..self.entries.len() {
                if self.resolved.get(entry_index) {
                    continue;
                }
                let target = {
                    let entry = &self.entries[entry_index];
                    match &entry.strategy {
                        ResolutionStrategy::ById(raw) => match remap.and_then(|map| map.to_runtime(*raw)) {
                            Some(mapped) => repository.contains(mapped).then_some(mapped),
                            None => repository.contains(*raw).then_some(*raw),
                        },
                        ResolutionStrategy::ByName { name, class_id } => index
                            .find_by_name(name, *class_id, hierarchy, repository)
                            .first()
                            .copied(),
                        ResolutionStrategy::ByGuid(guid) => index.find_by_guid(*guid).first().copied(),
                    }
                };

                let Some(target) = target else { continue };
                let entry = &self.entries[entry_index];
                let owner = repository.find_by_id_mut(entry.owner).ok_or_else(|| {
                    FormatError::not_found(format!("citation owner {} is not in the repository", entry.owner))
                })?;
                let chunk = owner.chunk_mut().ok_or_else(|| {
                    FormatError::invalid_data(format!("citation owner {} has no chunk to patch", entry.owner))
                })?;
                chunk.patch_dword(entry.site as usize, target.raw())?;

                self.resolved.set(entry_index);
                progressed = true;
            }

            if !progressed {
                break;
            }
        }

        let resolved = self.resolved.count_ones();
        Ok(ResolveOutcome {
            resolved,
            unresolved: self.entries.len() - resolved,
        })
    }
}
