// ── Section arena ──
//
// Five append-only section lists, one per UCI package, plus a name index
// that rejects duplicates as they are pushed. Sections reference each other
// by name, so the arena can check the whole graph without holding pointers.

use std::collections::{HashMap, HashSet};

use strum::IntoEnumIterator;

use crate::error::CoreError;
use crate::uci::attr::SectionName;
use crate::uci::{Node, Ref, Section, Subsystem};

/// Ordered sections of one build, grouped by package.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    lists: HashMap<Subsystem, Vec<Node>>,
    names: HashSet<(Subsystem, SectionName)>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section. Fails if its package already has a section of the
    /// same name.
    pub fn push(&mut self, section: impl Into<Node>) -> Result<(), CoreError> {
        let node = section.into();
        let subsystem = node.subsystem();
        if !self.names.insert((subsystem, node.name().clone())) {
            return Err(CoreError::DuplicateSection {
                subsystem,
                name: node.name().to_string(),
            });
        }
        self.lists.entry(subsystem).or_default().push(node);
        Ok(())
    }

    /// Append a section and hand back a reference to it.
    pub fn add<S>(&mut self, section: S) -> Result<Ref<S>, CoreError>
    where
        S: Section + Into<Node>,
    {
        let handle = section.handle();
        self.push(section)?;
        Ok(handle)
    }

    /// Move every section of `other` to the end of this builder, package by
    /// package, keeping their relative order.
    pub fn merge(&mut self, mut other: Builder) -> Result<(), CoreError> {
        for subsystem in Subsystem::iter() {
            for node in other.lists.remove(&subsystem).unwrap_or_default() {
                self.push(node)?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, subsystem: Subsystem, name: &SectionName) -> bool {
        self.names.contains(&(subsystem, name.clone()))
    }

    pub fn nodes(&self, subsystem: Subsystem) -> &[Node] {
        self.lists.get(&subsystem).map_or(&[], Vec::as_slice)
    }

    /// Every section, in artifact order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        Subsystem::iter().flat_map(|s| self.nodes(s).iter())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check that every reference points at a section inserted before the
    /// referencing one. Cross-package references (firewall zone to network
    /// interface) are resolved against the earlier packages in artifact order.
    pub fn verify_references(&self) -> Result<(), CoreError> {
        let mut seen: HashSet<(Subsystem, &SectionName)> = HashSet::new();
        for node in self.iter() {
            for (subsystem, name) in node.references() {
                if !seen.contains(&(subsystem, name)) {
                    return Err(CoreError::precondition(format!(
                        "{} section '{}' references {subsystem} section '{name}' which is not defined before it",
                        node.subsystem(),
                        node.name(),
                    )));
                }
            }
            seen.insert((node.subsystem(), node.name()));
        }
        Ok(())
    }
}
