//! Storage and external collaborator implementations.

pub mod payments;
pub mod repositories;
pub mod store;
