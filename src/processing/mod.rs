pub mod anchor;
pub mod diff;
pub mod position;
pub mod suggestions;
