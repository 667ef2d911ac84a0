//! Storefront domain: value objects and aggregates
pub mod aggregates;
pub mod value_objects;
