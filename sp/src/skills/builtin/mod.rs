//! Built-in skills
//!
//! Thin adapters over the backends the planner can route to: ticketing,
//! invoicing, knowledge lookup and city facts.

mod cities;
mod invoices;
mod rag;
mod service_desk;

pub use cities::CitiesSkill;
pub use invoices::{InvoiceStore, InvoicesSkill};
pub use rag::RagSkill;
pub use service_desk::ServiceDeskSkill;
