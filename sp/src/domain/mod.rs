//! Domain types shared by the planner and the skills

mod request;

pub use request::{PluginConfig, RequestContext};
