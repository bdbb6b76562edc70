pub mod multi_instance;
pub mod persistence;
