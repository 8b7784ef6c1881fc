//! Subject registry and resolution
//!
//! A request names either a concrete subject (a device owner whose readings
//! live in their own collection) or a composite alias. Aliases are data: each
//! [`SubjectGroup`] lists the concrete subjects it stands for, in the order
//! they are queried and folded.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// A named alias for an ordered set of concrete subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGroup {
    pub alias: String,
    /// Concrete subjects in resolution order. Empty means every registered
    /// subject, in registry order.
    #[serde(default)]
    pub members: Vec<String>,
}

impl SubjectGroup {
    /// Alias covering the whole registry.
    pub fn everyone(alias: &str) -> Self {
        Self {
            alias: String::from(alias),
            members: Vec::new(),
        }
    }
}

/// Invalid registry configuration, or an unresolvable subject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
    #[error("subject `{0}` is registered twice")]
    DuplicateSubject(String),
    #[error("alias `{0}` collides with a subject or another alias")]
    AliasCollision(String),
    #[error("alias `{alias}` references unknown subject `{member}`")]
    UnknownMember { alias: String, member: String },
}

/// Fixed registry of concrete subjects and composite aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRegistry {
    subjects: Vec<String>,
    groups: Vec<SubjectGroup>,
}

impl SubjectRegistry {
    /// Validates and builds a registry.
    ///
    /// Subject ids must be unique, aliases must not shadow a subject or each
    /// other, and every alias member must be a registered subject.
    pub fn new(subjects: Vec<String>, groups: Vec<SubjectGroup>) -> Result<Self, RegistryError> {
        for (i, subject) in subjects.iter().enumerate() {
            if subjects[..i].contains(subject) {
                return Err(RegistryError::DuplicateSubject(subject.clone()));
            }
        }

        for (i, group) in groups.iter().enumerate() {
            if subjects.contains(&group.alias)
                || groups[..i].iter().any(|g| g.alias == group.alias)
            {
                return Err(RegistryError::AliasCollision(group.alias.clone()));
            }
            if let Some(member) = group.members.iter().find(|m| !subjects.contains(m)) {
                return Err(RegistryError::UnknownMember {
                    alias: group.alias.clone(),
                    member: member.clone(),
                });
            }
        }

        Ok(Self { subjects, groups })
    }

    /// Registered concrete subjects in registry order.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn groups(&self) -> &[SubjectGroup] {
        &self.groups
    }

    /// True if `id` is a concrete subject (not an alias).
    pub fn is_concrete(&self, id: &str) -> bool {
        self.subjects.iter().any(|s| s == id)
    }

    /// Resolves a requested id to the concrete subjects to query.
    pub fn resolve(&self, id: &str) -> Result<Vec<&str>, RegistryError> {
        if let Some(subject) = self.subjects.iter().find(|s| *s == id) {
            return Ok(alloc::vec![subject.as_str()]);
        }

        let group = self
            .groups
            .iter()
            .find(|g| g.alias == id)
            .ok_or_else(|| RegistryError::UnknownSubject(String::from(id)))?;

        let members = if group.members.is_empty() {
            &self.subjects
        } else {
            &group.members
        };
        Ok(members.iter().map(String::as_str).collect())
    }
}
