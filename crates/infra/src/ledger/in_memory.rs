use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use factoring_stream::{CommandError, Ledger, LedgerCommand};

/// In-memory ledger that records every submitted command.
///
/// Intended for tests/dev. Choices can be set up to be refused or to fail delivery; every
/// other command is accepted. Nothing is ever applied to a contract stream.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    submitted: RwLock<Vec<LedgerCommand>>,
    failures: RwLock<HashMap<&'static str, CommandError>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every future command exercising `choice`.
    pub fn reject_choice(&self, choice: &'static str, reason: impl Into<String>) {
        self.fail_choice(choice, CommandError::Rejected(reason.into()));
    }

    /// Fail delivery of every future command exercising `choice`.
    pub fn disconnect_choice(&self, choice: &'static str, reason: impl Into<String>) {
        self.fail_choice(choice, CommandError::Unavailable(reason.into()));
    }

    /// Commands received so far, accepted or not, in arrival order.
    pub fn submitted(&self) -> Vec<LedgerCommand> {
        self.submitted.read().map(|s| s.clone()).unwrap_or_default()
    }

    fn fail_choice(&self, choice: &'static str, error: CommandError) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(choice, error);
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn exercise_by_key(&self, command: LedgerCommand) -> Result<(), CommandError> {
        let failure = self
            .failures
            .read()
            .map_err(|_| CommandError::Unavailable("lock poisoned".to_string()))?
            .get(command.choice)
            .cloned();

        debug!(template = %command.template, choice = command.choice, "command received");

        self.submitted
            .write()
            .map_err(|_| CommandError::Unavailable("lock poisoned".to_string()))?
            .push(command);

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoring_stream::TemplateId;

    fn command(choice: &'static str) -> LedgerCommand {
        LedgerCommand::new(
            TemplateId::new("Factoring.Seller", "Seller"),
            choice,
            serde_json::json!({ "_1": "Operator", "_2": "Seller1" }),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn records_accepted_and_refused_commands() {
        let ledger = InMemoryLedger::new();
        ledger.reject_choice("Seller_AddInvoice", "duplicate invoice");

        assert_eq!(
            ledger.exercise_by_key(command("Seller_AddInvoice")).await,
            Err(CommandError::Rejected("duplicate invoice".to_string()))
        );
        assert_eq!(ledger.exercise_by_key(command("Seller_SendInvoiceToAuction")).await, Ok(()));
        assert_eq!(ledger.submitted().len(), 2);
    }
}
