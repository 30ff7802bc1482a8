pub mod clock;
pub mod error;
pub mod phase;

pub use clock::*;
pub use error::*;
pub use phase::*;
