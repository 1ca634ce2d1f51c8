// SPDX-License-Identifier: MIT OR Apache-2.0
// Modules in this directory are produced by build.rs from proto/custos/.

pub mod group;
pub mod identity;
pub mod tenant;
