pub mod pattern;
pub mod resolver;
pub mod selector;
pub mod snapshot;
