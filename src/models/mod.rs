pub mod case;
pub mod condition;
pub mod enums;
pub mod medicine;
pub mod plan;
pub mod treatment;

pub use case::*;
pub use condition::*;
pub use enums::*;
pub use medicine::*;
pub use plan::*;
pub use treatment::*;
