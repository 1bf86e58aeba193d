pub mod catalog;
pub mod observation;
pub mod property_value;
pub mod station;
