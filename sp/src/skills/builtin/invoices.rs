//! invoices skill - invoice lookup and upsert over an in-memory store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::skills::traits::require;
use crate::skills::{Arguments, ParamKind, Parameter, Skill, SkillError, SkillFunction};

/// Shared invoice store, keyed by invoice id
pub type InvoiceStore = Arc<RwLock<BTreeMap<i64, Map<String, Value>>>>;

/// Builder for the `invoices` skill
pub struct InvoicesSkill;

impl InvoicesSkill {
    /// Skill over a freshly seeded store
    pub fn build() -> Skill {
        Self::with_store(Self::seeded_store())
    }

    /// Skill over a caller-provided store
    pub fn with_store(store: InvoiceStore) -> Skill {
        debug!("InvoicesSkill::with_store: called");
        Skill::new(
            "invoices",
            "Retrieve information about invoices and the users related to them. Execute write operations on \
             invoices like update, upsert on inserts.",
        )
        .with_function(ListInvoices { store: store.clone() })
        .with_function(GetInvoice { store: store.clone() })
        .with_function(UpdateInvoice { store })
    }

    /// Store with a handful of sample invoices
    pub fn seeded_store() -> InvoiceStore {
        let seed = [
            json!({ "id": 1, "user_id": 5, "amount": 120.5, "status": "paid" }),
            json!({ "id": 2, "user_id": 5, "amount": 89.99, "status": "pending" }),
            json!({ "id": 3, "user_id": 7, "amount": 300.0, "status": "pending" }),
            json!({ "id": 4, "user_id": 9, "amount": 42.0, "status": "cancelled" }),
        ];
        let invoices = seed
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => map.get("id").and_then(Value::as_i64).map(|id| (id, map)),
                _ => None,
            })
            .collect();
        Arc::new(RwLock::new(invoices))
    }
}

/// Read an integer argument, accepting numeric strings from the model
fn int_arg(value: &Value, name: &str) -> Result<i64, SkillError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SkillError::InvalidArgument(format!("{} must be an integer, got {}", name, value)))
}

struct ListInvoices {
    store: InvoiceStore,
}

#[async_trait]
impl SkillFunction for ListInvoices {
    fn name(&self) -> &'static str {
        "list_invoices"
    }

    fn description(&self) -> &'static str {
        "List all the invoices belonging to a user"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::required("user_id", ParamKind::Integer, "Id of the user owning the invoices")]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        let user_id = int_arg(require(args, "user_id")?, "user_id")?;
        debug!(%user_id, "ListInvoices::invoke: called");
        let store = self.store.read().await;
        let invoices: Vec<Value> = store
            .values()
            .filter(|inv| inv.get("user_id").and_then(Value::as_i64) == Some(user_id))
            .cloned()
            .map(Value::Object)
            .collect();
        Ok(Value::Array(invoices))
    }
}

struct GetInvoice {
    store: InvoiceStore,
}

#[async_trait]
impl SkillFunction for GetInvoice {
    fn name(&self) -> &'static str {
        "get_invoice"
    }

    fn description(&self) -> &'static str {
        "Get a single invoice by its id"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::required("id", ParamKind::Integer, "Invoice id")]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        let id = int_arg(require(args, "id")?, "id")?;
        debug!(%id, "GetInvoice::invoke: called");
        let store = self.store.read().await;
        store
            .get(&id)
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| SkillError::Failed(format!("Invoice {} not found", id)))
    }
}

struct UpdateInvoice {
    store: InvoiceStore,
}

#[async_trait]
impl SkillFunction for UpdateInvoice {
    fn name(&self) -> &'static str {
        "update_invoice"
    }

    fn description(&self) -> &'static str {
        "Update the fields of an invoice, inserting it when it does not exist yet"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::required(
            "invoice",
            ParamKind::Object,
            "Invoice fields in dict format, must include the invoice id. Example {'id': 1, 'status': 'paid'}",
        )]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        debug!("UpdateInvoice::invoke: called");
        let fields = match require(args, "invoice")? {
            Value::Object(map) => map.clone(),
            Value::String(s) => serde_json::from_str::<Map<String, Value>>(s)
                .map_err(|e| SkillError::InvalidArgument(format!("invoice is not a JSON object: {}", e)))?,
            other => {
                return Err(SkillError::InvalidArgument(format!("invoice must be an object, got {}", other)));
            }
        };
        let id = int_arg(fields.get("id").ok_or_else(|| SkillError::missing("invoice.id"))?, "id")?;

        let mut store = self.store.write().await;
        let invoice = store.entry(id).or_default();
        let inserted = invoice.is_empty();
        for (key, value) in fields {
            invoice.insert(key, value);
        }
        invoice.insert("id".to_string(), json!(id));
        info!(%id, %inserted, "Invoice stored");
        Ok(Value::Object(invoice.clone()))
    }
}
