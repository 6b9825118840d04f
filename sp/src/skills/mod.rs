//! Skill system
//!
//! A skill is a named group of functions backed by some service (ticketing,
//! invoicing, knowledge lookup, city facts). The planner names functions as
//! `skill.function`; the `SkillRegistry` resolves those references to
//! invocable handles.

mod error;
mod reference;
mod registry;
pub mod traits;

pub mod builtin;
pub mod http;

pub use error::{RegistryError, SkillError};
pub use reference::FunctionRef;
pub use registry::{ResolvedFunction, SkillRegistry, SkillSummary};
pub use traits::{Arguments, ParamKind, Parameter, Skill, SkillFunction, output_text};
