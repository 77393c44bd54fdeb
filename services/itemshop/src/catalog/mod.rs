//! Catalog document → canonical shop sections
//!
//! This module implements the schema-tolerant core:
//! 1. Locating the sections list anywhere in the catalog document
//! 2. Resolving aliased fields on wrapped section records
//! 3. Aggregating stack rank validity windows per (context, productTag)
//! 4. Counting offer groups and collecting texture URLs
//! 5. Normalizing each raw section into a `CanonicalSection`

pub mod locate;
pub mod resolve;
pub mod stack_ranks;
pub mod offer_groups;
pub mod section;
pub mod normalize;

pub use locate::*;
pub use resolve::*;
pub use stack_ranks::*;
pub use offer_groups::*;
pub use section::*;
pub use normalize::*;
