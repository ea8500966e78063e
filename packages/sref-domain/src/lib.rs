//! Catalog rules and the pure search pipeline: predicate building, sort resolution and facet
//! tallying. Nothing in this crate performs I/O.

pub mod access;
pub mod catalog;
pub mod facets;
pub mod pagination;
pub mod ranking;
pub mod search;
pub mod text;
