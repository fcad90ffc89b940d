//! Domain identifiers, resource references, operation classes, and share tokens.

pub mod class;
pub mod id;
pub mod resource;
pub mod token;

pub use class::*;
pub use id::*;
pub use resource::*;
pub use token::*;
