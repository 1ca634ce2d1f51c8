// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed request/response records for the Custos services.
//!
//! These are plain-data wrappers around the generated prost types: explicit
//! records validated at the boundary instead of dynamic payloads.

mod group;
mod tenant;
mod token;

pub use group::{GroupDefinition, GroupMembership, GroupRecord, MembershipType};
pub use tenant::{CreateTenantRequest, CreateTenantResponse, TenantProfile};
pub use token::{GrantType, Token, TokenRequest};
