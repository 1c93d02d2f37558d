//! API request handlers.

pub mod channels;
pub mod classes;
pub mod status;

pub use channels::*;
pub use classes::*;
pub use status::*;
