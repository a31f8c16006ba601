pub mod client;
pub mod config;
pub mod types;

// Local artifacts (connection document, dated backup folders) carry this
// prefix : the watcher must never feed them back into the sync loop.
pub const RESERVED_PREFIX: char = '_';
