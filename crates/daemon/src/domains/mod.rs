pub mod extract;
pub mod load;
pub mod transform;

pub use extract::*;
pub use load::*;
pub use transform::*;
