// Data models

pub mod achievement;
pub mod exercise;
pub mod food;
pub mod nutrition_log;
pub mod profile;
pub mod user;
pub mod workout;
pub mod workout_log;

pub use achievement::*;
pub use exercise::*;
pub use food::*;
pub use nutrition_log::*;
pub use profile::*;
pub use user::*;
pub use workout::*;
pub use workout_log::*;
