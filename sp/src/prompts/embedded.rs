//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Plan synthesis prompt
pub const PLANNER: &str = include_str!("../../prompts/planner.pmt");

/// Question rewrite prompt
pub const QUESTION_UPDATE: &str = include_str!("../../prompts/question_update.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "planner" => {
            debug!("get_embedded: matched planner");
            Some(PLANNER)
        }
        "question_update" => {
            debug!("get_embedded: matched question_update");
            Some(QUESTION_UPDATE)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
