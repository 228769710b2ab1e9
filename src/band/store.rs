//! Band state store.

use std::collections::HashSet;

use crate::band::{BandMember, MemberId, Section};
use crate::error::LoadError;

/// Authoritative container for every member in the current run.
///
/// Members are kept in roster order. The roster size is fixed once the store
/// is built; mutation happens only through [`crate::band::BandApi`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandStore {
    members: Vec<BandMember>,
}

impl BandStore {
    /// Build a store from members in roster order.
    ///
    /// Every member is re-normalized so loaded data obeys the field bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateMember`] if two members share an id.
    pub fn from_members(members: Vec<BandMember>) -> Result<Self, LoadError> {
        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            if !seen.insert(member.id()) {
                return Err(LoadError::DuplicateMember(member.id()));
            }
        }
        Ok(Self {
            members: members.into_iter().map(BandMember::normalized).collect(),
        })
    }

    /// Look up a member by id. Returns `None` rather than failing.
    #[must_use]
    pub fn get_member(&self, id: MemberId) -> Option<&BandMember> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// All members in roster order.
    #[must_use]
    pub fn get_all_members(&self) -> &[BandMember] {
        &self.members
    }

    /// Members of the named section. Unknown names yield an empty list.
    #[must_use]
    pub fn get_section(&self, name: &str) -> Vec<&BandMember> {
        Section::parse(name).map_or_else(Vec::new, |section| {
            self.section_members(section).collect()
        })
    }

    /// Members of a section in roster order.
    pub fn section_members(&self, section: Section) -> impl Iterator<Item = &BandMember> {
        self.members.iter().filter(move |m| m.section() == section)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the store holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Roster index of a member id.
    #[must_use]
    pub fn index_of(&self, id: MemberId) -> Option<usize> {
        self.members.iter().position(|m| m.id() == id)
    }

    /// Build a store without validation, for invariant tests.
    #[cfg(test)]
    pub(crate) fn from_raw(members: Vec<BandMember>) -> Self {
        Self { members }
    }

    pub(crate) fn member_mut(&mut self, index: usize) -> Option<&mut BandMember> {
        self.members.get_mut(index)
    }
}
