// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod generated;

// Re-export API modules
pub use generated::group;
pub use generated::identity;
pub use generated::tenant;
