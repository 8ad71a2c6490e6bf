pub mod domain_event;
pub mod sink;

pub use domain_event::*;
pub use sink::*;
