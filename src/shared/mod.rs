pub mod clock;
pub mod observability;
pub mod shutdown;
pub mod types;
pub mod utills;
pub mod validations;

pub use clock::*;
pub use shutdown::*;
pub use types::*;
pub use utills::*;
pub use validations::*;
