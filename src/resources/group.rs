// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for group management.

use crate::api::group::{
    Group as ProtoGroup, MembershipRequest as ProtoMembershipRequest,
};

/// A group to be created.
#[derive(Debug, Clone, Default)]
pub struct GroupDefinition {
    /// Group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// User id of the group owner.
    pub owner_id: String,
}

impl GroupDefinition {
    /// Define a group with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the owning user.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }
}

impl From<GroupDefinition> for ProtoGroup {
    fn from(def: GroupDefinition) -> Self {
        ProtoGroup {
            // Assigned by the server on creation
            id: String::new(),
            name: def.name,
            description: def.description,
            owner_id: def.owner_id,
        }
    }
}

/// A stored group as returned by the server.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    /// Server-assigned group id.
    pub id: String,
    /// Group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// User id of the group owner.
    pub owner_id: String,
}

impl From<ProtoGroup> for GroupRecord {
    fn from(proto: ProtoGroup) -> Self {
        Self {
            id: proto.id,
            name: proto.name,
            description: proto.description,
            owner_id: proto.owner_id,
        }
    }
}

/// Role a user holds within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipType {
    /// Regular member.
    #[default]
    Member,
    /// Group administrator.
    Admin,
}

impl MembershipType {
    /// Wire representation of the membership type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Member => "MEMBER",
            MembershipType::Admin => "ADMIN",
        }
    }
}

/// A user's membership in a group.
#[derive(Debug, Clone)]
pub struct GroupMembership {
    /// Target group id.
    pub group_id: String,
    /// Username of the member.
    pub username: String,
    /// Role within the group.
    pub membership_type: MembershipType,
}

impl GroupMembership {
    /// Membership of `username` in `group_id` as a regular member.
    #[must_use]
    pub fn new(group_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            username: username.into(),
            membership_type: MembershipType::Member,
        }
    }

    /// Set the membership type.
    #[must_use]
    pub fn with_type(mut self, membership_type: MembershipType) -> Self {
        self.membership_type = membership_type;
        self
    }
}

impl From<GroupMembership> for ProtoMembershipRequest {
    fn from(membership: GroupMembership) -> Self {
        ProtoMembershipRequest {
            group_id: membership.group_id,
            username: membership.username,
            membership_type: membership.membership_type.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builders() {
        let def = GroupDefinition::new("analysts")
            .with_description("Data analysts")
            .with_owner("user-1");

        assert_eq!(def.name, "analysts");
        assert_eq!(def.description, "Data analysts");
        assert_eq!(def.owner_id, "user-1");
    }

    #[test]
    fn test_definition_proto_conversion() {
        let proto: ProtoGroup = GroupDefinition::new("analysts").into();
        assert!(proto.id.is_empty());
        assert_eq!(proto.name, "analysts");
    }

    #[test]
    fn test_membership_defaults_to_member() {
        let membership = GroupMembership::new("g-1", "jdoe");
        assert_eq!(membership.membership_type, MembershipType::Member);

        let proto: ProtoMembershipRequest = membership.into();
        assert_eq!(proto.membership_type, "MEMBER");
    }

    #[test]
    fn test_membership_admin() {
        let membership = GroupMembership::new("g-1", "jdoe").with_type(MembershipType::Admin);
        let proto: ProtoMembershipRequest = membership.into();
        assert_eq!(proto.membership_type, "ADMIN");
        assert_eq!(proto.group_id, "g-1");
        assert_eq!(proto.username, "jdoe");
    }
}
