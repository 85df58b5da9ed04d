pub mod audit;
pub mod project;
pub mod scan;
pub mod setting;
pub mod stats;
pub mod target;
pub mod tool_config;
pub mod user;
pub mod vulnerability;

pub use audit::*;
pub use project::*;
pub use scan::*;
pub use setting::*;
pub use stats::*;
pub use target::*;
pub use tool_config::*;
pub use user::*;
pub use vulnerability::*;
