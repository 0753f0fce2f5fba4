pub mod accumulator;
pub mod anki;
pub mod audio;
pub mod card;
pub mod export;
pub mod presentation;
pub mod session;
pub mod store;
