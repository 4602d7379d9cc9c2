//! Read side of the NovaBlog JSON contract.
//!
//! [`BlogStore`] reads the directory the exporter writes and answers the
//! queries the blog client makes: the listing, single posts (cached), related
//! posts by shared tags, tag and text search, and tag counts.

pub mod reading;
pub mod store;

pub use reading::reading_time;
pub use store::{BlogStore, CatalogError, Post, TagCount, DEFAULT_RELATED_LIMIT};
