//! Honeypot fields: hidden inputs that only bots fill in.

use serde_json::Value;

use crate::security::error::GuardError;
use crate::security::guard::{Guard, RequestContext};

#[derive(Debug, Clone)]
pub struct HoneypotGuard {
    fields: Vec<String>,
}

impl HoneypotGuard {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Guard for HoneypotGuard {
    fn name(&self) -> &'static str {
        "honeypot"
    }

    fn inspect(&self, ctx: &RequestContext) -> Result<(), GuardError> {
        for field in &self.fields {
            if ctx.body.get(field).is_some_and(is_truthy) {
                tracing::debug!(field = %field, "Honeypot field filled");
                return Err(GuardError::BotSuspected { field: field.clone() });
            }
        }
        Ok(())
    }

    fn needs_body(&self) -> bool {
        true
    }
}

/// Empty strings, `false`, `null`, zero and empty containers count as unfilled.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
