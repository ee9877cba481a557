//! Sort and projection descriptors and their compact string encoding.
//!
//! The wire form is a comma-joined list: `Name,CreatedAt desc` for sorts,
//! `Name,CreatedAt` for projections. Deserialization is permissive — an
//! unknown trailing token is kept as part of the member name rather than
//! rejected, since this format feeds an internal subsystem.

use serde::{Deserialize, Serialize};

pub const TOKEN_ASCENDING: &str = "asc";
pub const TOKEN_DESCENDING: &str = "desc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Declarative sorting: a member name plus a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub member: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(member: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            member: member.into(),
            direction,
        }
    }

    pub fn ascending(member: impl Into<String>) -> Self {
        Self::new(member, SortDirection::Ascending)
    }

    pub fn descending(member: impl Into<String>) -> Self {
        Self::new(member, SortDirection::Descending)
    }
}

/// Declarative projection: a bare member name. An empty projection list
/// means "all members".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectDescriptor {
    pub member: String,
}

impl SelectDescriptor {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
        }
    }
}

/// One element of a comma-joined descriptor list.
pub trait Descriptor: Sized {
    fn serialize_item(&self) -> String;
    fn deserialize_item(source: &str) -> Self;
}

impl Descriptor for SortDescriptor {
    fn serialize_item(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.member.clone(),
            SortDirection::Descending => format!("{} {}", self.member, TOKEN_DESCENDING),
        }
    }

    fn deserialize_item(source: &str) -> Self {
        let trimmed = source.trim();

        if let Some((member, direction)) = trimmed.rsplit_once(char::is_whitespace) {
            if direction.eq_ignore_ascii_case(TOKEN_DESCENDING) {
                return SortDescriptor::descending(member.trim_end());
            }
            if direction.eq_ignore_ascii_case(TOKEN_ASCENDING) {
                return SortDescriptor::ascending(member.trim_end());
            }
        }

        SortDescriptor::ascending(trimmed)
    }
}

impl Descriptor for SelectDescriptor {
    fn serialize_item(&self) -> String {
        self.member.clone()
    }

    fn deserialize_item(source: &str) -> Self {
        SelectDescriptor::new(source.trim())
    }
}

/// Join a descriptor list into its compact comma-separated form.
pub fn serialize_descriptors<D: Descriptor>(items: &[D]) -> String {
    items
        .iter()
        .map(Descriptor::serialize_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a compact comma-separated form back into a descriptor list.
///
/// Blank input yields an empty list; blank segments are skipped. Order is
/// preserved and duplicates are kept.
pub fn deserialize_descriptors<D: Descriptor>(source: &str) -> Vec<D> {
    source
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(D::deserialize_item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_deserialization() {
        let sorts: Vec<SortDescriptor> = deserialize_descriptors("Name,CreatedAt desc");
        assert_eq!(
            sorts,
            vec![
                SortDescriptor::ascending("Name"),
                SortDescriptor::descending("CreatedAt"),
            ]
        );
    }

    #[test]
    fn test_explicit_asc_is_normalized() {
        let sorts: Vec<SortDescriptor> = deserialize_descriptors("Name ASC");
        assert_eq!(sorts, vec![SortDescriptor::ascending("Name")]);
        assert_eq!(serialize_descriptors(&sorts), "Name");
    }

    #[test]
    fn test_unknown_trailing_token_stays_in_member() {
        let sorts: Vec<SortDescriptor> = deserialize_descriptors("Name foo");
        assert_eq!(sorts, vec![SortDescriptor::ascending("Name foo")]);
    }

    #[test]
    fn test_blank_input_yields_empty_list() {
        let sorts: Vec<SortDescriptor> = deserialize_descriptors("");
        assert!(sorts.is_empty());
        let sorts: Vec<SortDescriptor> = deserialize_descriptors("  ");
        assert!(sorts.is_empty());
    }

    #[test]
    fn test_blank_segments_are_skipped() {
        let selects: Vec<SelectDescriptor> = deserialize_descriptors("a,,b");
        assert_eq!(
            selects,
            vec![SelectDescriptor::new("a"), SelectDescriptor::new("b")]
        );
    }

    #[test]
    fn test_sort_round_trip() {
        let sorts = vec![
            SortDescriptor::ascending("Name"),
            SortDescriptor::descending("CreatedAt"),
            SortDescriptor::ascending("Id"),
        ];
        let encoded = serialize_descriptors(&sorts);
        assert_eq!(encoded, "Name,CreatedAt desc,Id");
        let decoded: Vec<SortDescriptor> = deserialize_descriptors(&encoded);
        assert_eq!(decoded, sorts);
    }

    #[test]
    fn test_select_round_trip() {
        let selects = vec![
            SelectDescriptor::new("Id"),
            SelectDescriptor::new("Name"),
            SelectDescriptor::new("Name"),
        ];
        let encoded = serialize_descriptors(&selects);
        assert_eq!(encoded, "Id,Name,Name");
        let decoded: Vec<SelectDescriptor> = deserialize_descriptors(&encoded);
        assert_eq!(decoded, selects);
    }
}
