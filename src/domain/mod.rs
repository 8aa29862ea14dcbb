pub mod outcome;
pub mod pattern;
pub mod round;
pub mod state;

pub use outcome::*;
pub use pattern::*;
pub use round::*;
pub use state::*;
