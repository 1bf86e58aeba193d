pub mod error;
pub mod group;
pub mod record;
pub mod resolver;
pub mod timestamp;
pub mod tree;
pub mod unit;
