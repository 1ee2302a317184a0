pub mod projector;
pub mod store;
