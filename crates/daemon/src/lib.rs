mod compass;
mod domains;
mod models;
mod pipeline;
mod scheduler;
mod settings;
mod store;
mod utils;

pub use compass::*;
pub use domains::*;
pub use models::*;
pub use pipeline::*;
pub use scheduler::*;
pub use settings::*;
pub use store::*;
pub use utils::*;
