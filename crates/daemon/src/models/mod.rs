pub mod openweather;
pub mod reading;

pub use openweather::*;
pub use reading::*;
