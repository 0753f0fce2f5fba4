pub mod location;
pub mod network;
pub mod structure;
