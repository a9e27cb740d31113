mod churn;
mod exit_after;
mod query;
mod scene_loader;
mod time;

pub use churn::EntityChurnSystem;
pub use exit_after::ExitAfterFramesSystem;
pub use query::EntityQuerySystem;
pub use scene_loader::SceneLoaderSystem;
pub use time::TimeControlSystem;
