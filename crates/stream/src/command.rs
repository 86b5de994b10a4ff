use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Qualified template name (`Module.Path:Entity`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TemplateId {
    pub module: &'static str,
    pub entity: &'static str,
}

impl TemplateId {
    pub const fn new(module: &'static str, entity: &'static str) -> Self {
        Self { module, entity }
    }
}

impl core::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.module, self.entity)
    }
}

/// A choice exercised on a contract looked up by key.
///
/// Commands express **intent**; the ledger decides. Nothing here implies the projection
/// changes: an accepted command shows up later as a new snapshot, a rejected one never does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerCommand {
    pub template: TemplateId,
    pub choice: &'static str,
    pub key: JsonValue,
    pub argument: JsonValue,
}

impl LedgerCommand {
    pub fn new(
        template: TemplateId,
        choice: &'static str,
        key: JsonValue,
        argument: JsonValue,
    ) -> Self {
        Self {
            template,
            choice,
            key,
            argument,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The ledger evaluated the command and refused it.
    #[error("command rejected by ledger: {0}")]
    Rejected(String),

    /// The command could not be delivered (connection, timeout, ...).
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Command submission boundary to the external ledger.
///
/// Submission is asynchronous and at-least-once; deduplication and consistency
/// enforcement belong to the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn exercise_by_key(&self, command: LedgerCommand) -> Result<(), CommandError>;
}

#[async_trait]
impl<L> Ledger for Arc<L>
where
    L: Ledger + ?Sized,
{
    async fn exercise_by_key(&self, command: LedgerCommand) -> Result<(), CommandError> {
        (**self).exercise_by_key(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_renders_qualified_name() {
        let template = TemplateId::new("Factoring.Seller", "Seller");
        assert_eq!(template.to_string(), "Factoring.Seller:Seller");
    }
}
