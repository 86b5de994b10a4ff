//! Command submission pipeline (user intent → ledger).
//!
//! The dispatcher turns a user intent into a [`LedgerCommand`] and submits it through the
//! injected [`Ledger`]:
//!
//! ```text
//! Intent
//!   ↓
//! 1. Validate input (pure; nothing is sent when this fails)
//!   ↓
//! 2. Resolve preconditions against the latest snapshots (may skip)
//!   ↓
//! 3. Build the keyed choice + argument
//!   ↓
//! 4. Submit to the ledger (async, at-least-once)
//! ```
//!
//! ## Projection isolation
//!
//! No call here touches a projection. An accepted command becomes visible only when the
//! ledger emits a new snapshot; a rejected one never does. Callers learn the outcome from the
//! returned [`DispatchOutcome`] / [`DispatchError`] only.
//!
//! ## Ordering
//!
//! Submissions started with [`CommandDispatcher::dispatch_detached`] run on their own tokio
//! task with no ordering guarantee relative to each other or to projection recomputes.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use factoring_core::{CalendarDate, ContractId, DomainError, Numeric, PartyId};
use factoring_invoicing::{BrokerCustomerSeller, Invoice};
use factoring_stream::{CommandError, Contract, Ledger, LedgerCommand, Snapshot, TemplateId};

pub const SELLER_TEMPLATE: TemplateId = TemplateId::new("Factoring.Seller", "Seller");
pub const BROKER_CUSTOMER_SELLER_TEMPLATE: TemplateId =
    TemplateId::new("Factoring.Broker", "BrokerCustomerSeller");

pub const ADD_INVOICE: &str = "Seller_AddInvoice";
pub const SEND_INVOICE_TO_AUCTION: &str = "Seller_SendInvoiceToAuction";
pub const SEND_INVOICE_TO_BROKER: &str = "BrokerCustomerSeller_SendInvoiceToBroker";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Input failed validation; nothing was submitted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The ledger refused the command.
    #[error("command rejected: {0}")]
    Rejected(String),

    /// The command could not be delivered.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A record could not be encoded as a command argument.
    #[error("failed to encode command argument: {0}")]
    Encode(String),
}

impl From<CommandError> for DispatchError {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::Rejected(msg) => DispatchError::Rejected(msg),
            CommandError::Unavailable(msg) => DispatchError::Unavailable(msg),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            other => DispatchError::Validation(other.to_string()),
        }
    }
}

/// Why a command was deliberately not submitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoBrokerRelationship,
    InvoiceNotFound,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The ledger accepted the submission.
    Submitted,
    /// A precondition was not met; nothing was sent.
    Skipped(SkipReason),
}

/// Raw "new invoice" form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub payer: String,
    pub invoice_number: String,
    pub amount: String,
    pub issue_date: String,
    pub due_date: String,
}

struct ValidInvoice {
    payer: PartyId,
    invoice_number: String,
    amount: Decimal,
    issue_date: CalendarDate,
    due_date: CalendarDate,
}

impl NewInvoice {
    fn validate(&self) -> Result<ValidInvoice, DomainError> {
        let payer = required("payer", &self.payer)?;
        let invoice_number = required("invoiceNumber", &self.invoice_number)?;
        let amount = Numeric::new(required("amount", &self.amount)?).parse_positive("amount")?;

        let issue = CalendarDate::new(required("issueDate", &self.issue_date)?);
        let due = CalendarDate::new(required("dueDate", &self.due_date)?);
        let (issue_on, due_on) = (issue.parse("issueDate")?, due.parse("dueDate")?);
        if due_on < issue_on {
            return Err(DomainError::validation(format!(
                "due date {due} precedes issue date {issue}"
            )));
        }

        Ok(ValidInvoice {
            payer: PartyId::new(payer),
            invoice_number: invoice_number.to_string(),
            amount,
            issue_date: CalendarDate::from(issue_on),
            due_date: CalendarDate::from(due_on),
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Terms for offering an invoice at auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionTerms {
    pub minimum_quantity: Numeric,
    pub minimum_proceeds: Numeric,
    pub bid_increment: Numeric,
    pub end_date: CalendarDate,
}

impl AuctionTerms {
    pub fn new(
        minimum_quantity: impl Into<Numeric>,
        minimum_proceeds: impl Into<Numeric>,
        bid_increment: impl Into<Numeric>,
        end_date: impl Into<CalendarDate>,
    ) -> Self {
        Self {
            minimum_quantity: minimum_quantity.into(),
            minimum_proceeds: minimum_proceeds.into(),
            bid_increment: bid_increment.into(),
            end_date: end_date.into(),
        }
    }

    /// Caller-side helper: `bid_increment × minimum_price`.
    pub fn minimum_proceeds(bid_increment: Decimal, minimum_price: Decimal) -> Decimal {
        bid_increment * minimum_price
    }

    fn validate(&self) -> Result<JsonValue, DomainError> {
        let minimum_quantity = self.minimum_quantity.parse_positive("minimumQuantity")?;
        let minimum_proceeds = self.minimum_proceeds.parse_positive("minimumProceeds")?;
        let bid_increment = self.bid_increment.parse_positive("bidIncrement")?;
        let end_date = self.end_date.parse("endDate")?;

        Ok(json!({
            "minimumQuantity": Numeric::from(minimum_quantity),
            "minimumProceeds": Numeric::from(minimum_proceeds),
            "bidIncrement": Numeric::from(bid_increment),
            "endDate": CalendarDate::from(end_date),
        }))
    }
}

/// A user intent, for detached submission.
#[derive(Debug, Clone)]
pub enum CommandIntent {
    CreateInvoice(NewInvoice),
    SendToBroker {
        invoice_cid: ContractId,
        invoices: Snapshot<Invoice>,
        relationships: Snapshot<BrokerCustomerSeller>,
    },
    SendToAuction {
        invoice: Contract<Invoice>,
        terms: AuctionTerms,
    },
}

/// Submits seller commands to the ledger on behalf of one `(operator, seller)` pair.
#[derive(Debug)]
pub struct CommandDispatcher<L> {
    ledger: L,
    operator: PartyId,
    seller: PartyId,
}

impl<L> CommandDispatcher<L> {
    pub fn new(ledger: L, operator: PartyId, seller: PartyId) -> Self {
        Self {
            ledger,
            operator,
            seller,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

impl<L: Ledger> CommandDispatcher<L> {
    /// Exercise `Seller_AddInvoice` keyed by `(operator, seller)`.
    pub async fn create_invoice(&self, form: &NewInvoice) -> Result<DispatchOutcome, DispatchError> {
        let invoice = form.validate().inspect_err(|err| {
            warn!(seller = %self.seller, error = %err, "invoice form rejected");
        })?;

        let command = LedgerCommand::new(
            SELLER_TEMPLATE,
            ADD_INVOICE,
            tuple_key(&[&self.operator, &self.seller]),
            json!({
                "payer": invoice.payer,
                "invoiceNumber": invoice.invoice_number,
                "amount": Numeric::from(invoice.amount),
                "issueDate": invoice.issue_date,
                "dueDate": invoice.due_date,
            }),
        );
        self.submit(command).await
    }

    /// Exercise `BrokerCustomerSeller_SendInvoiceToBroker` keyed by `(broker, operator, seller)`.
    ///
    /// Skipped when the seller has no broker relationship or the invoice is not in
    /// `invoices`. With several relationships the first one in snapshot order is used.
    pub async fn send_to_broker(
        &self,
        invoice_cid: &ContractId,
        invoices: &Snapshot<Invoice>,
        relationships: &Snapshot<BrokerCustomerSeller>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(relationship) = relationships
            .iter()
            .map(Contract::payload)
            .find(|rel| rel.broker_customer == self.seller)
        else {
            info!(seller = %self.seller, "no broker relationship; send to broker skipped");
            return Ok(DispatchOutcome::Skipped(SkipReason::NoBrokerRelationship));
        };

        let Some(invoice) = invoices.find(invoice_cid) else {
            info!(invoice = %invoice_cid, "invoice not in latest snapshot; send to broker skipped");
            return Ok(DispatchOutcome::Skipped(SkipReason::InvoiceNotFound));
        };

        let payload = serde_json::to_value(invoice.payload())
            .map_err(|e| DispatchError::Encode(e.to_string()))?;

        let command = LedgerCommand::new(
            BROKER_CUSTOMER_SELLER_TEMPLATE,
            SEND_INVOICE_TO_BROKER,
            tuple_key(&[&relationship.broker, &self.operator, &self.seller]),
            json!({ "invoice": payload }),
        );
        self.submit(command).await
    }

    /// Exercise `Seller_SendInvoiceToAuction` keyed by `(operator, seller)`.
    pub async fn send_to_auction(
        &self,
        invoice: &Contract<Invoice>,
        terms: &AuctionTerms,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut argument = terms.validate().inspect_err(|err| {
            warn!(seller = %self.seller, invoice = %invoice.contract_id(), error = %err, "auction terms rejected");
        })?;
        argument["invoiceCids"] = json!([invoice.contract_id()]);

        let command = LedgerCommand::new(
            SELLER_TEMPLATE,
            SEND_INVOICE_TO_AUCTION,
            tuple_key(&[&self.operator, &self.seller]),
            argument,
        );
        self.submit(command).await
    }

    pub async fn dispatch(&self, intent: CommandIntent) -> Result<DispatchOutcome, DispatchError> {
        match intent {
            CommandIntent::CreateInvoice(form) => self.create_invoice(&form).await,
            CommandIntent::SendToBroker {
                invoice_cid,
                invoices,
                relationships,
            } => self.send_to_broker(&invoice_cid, &invoices, &relationships).await,
            CommandIntent::SendToAuction { invoice, terms } => {
                self.send_to_auction(&invoice, &terms).await
            }
        }
    }

    async fn submit(&self, command: LedgerCommand) -> Result<DispatchOutcome, DispatchError> {
        let template = command.template;
        let choice = command.choice;

        match self.ledger.exercise_by_key(command).await {
            Ok(()) => {
                info!(template = %template, choice, seller = %self.seller, "command submitted");
                Ok(DispatchOutcome::Submitted)
            }
            Err(err) => {
                error!(template = %template, choice, seller = %self.seller, error = %err, "command failed");
                Err(err.into())
            }
        }
    }
}

impl<L> CommandDispatcher<L>
where
    L: Ledger + 'static,
{
    /// Fire-and-forget: submit on a new tokio task.
    ///
    /// Must be called within a tokio runtime. The handle may be dropped; the outcome is
    /// still logged.
    pub fn dispatch_detached(
        self: &Arc<Self>,
        intent: CommandIntent,
    ) -> JoinHandle<Result<DispatchOutcome, DispatchError>> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(intent).await })
    }
}

/// Ledger tuple key `{"_1": .., "_2": .., ...}`.
fn tuple_key(parties: &[&PartyId]) -> JsonValue {
    let fields = parties
        .iter()
        .enumerate()
        .map(|(i, party)| (format!("_{}", i + 1), JsonValue::String(party.to_string())))
        .collect();
    JsonValue::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use factoring_invoicing::{RawStatus, Token};

    use crate::ledger::InMemoryLedger;

    fn dispatcher() -> CommandDispatcher<Arc<InMemoryLedger>> {
        CommandDispatcher::new(
            Arc::new(InMemoryLedger::new()),
            PartyId::new("Operator"),
            PartyId::new("Seller1"),
        )
    }

    fn form() -> NewInvoice {
        NewInvoice {
            payer: "Acme Corp".to_string(),
            invoice_number: "ab123".to_string(),
            amount: "100000.50".to_string(),
            issue_date: "2021-01-04".to_string(),
            due_date: "2021-04-04".to_string(),
        }
    }

    fn invoice() -> Invoice {
        Invoice {
            operator: PartyId::new("Operator"),
            payer: PartyId::new("Acme Corp"),
            seller: PartyId::new("Seller1"),
            initial_owner: PartyId::new("Seller1"),
            invoice_number: "ab123".to_string(),
            amount: Numeric::from("100"),
            issue_date: CalendarDate::from("2021-01-04"),
            due_date: CalendarDate::from("2021-04-04"),
            token: Token::new("ab123"),
            status: RawStatus::new("InvoiceOpen", json!({})),
        }
    }

    fn relationship() -> BrokerCustomerSeller {
        BrokerCustomerSeller {
            broker: PartyId::new("Broker1"),
            operator: PartyId::new("Operator"),
            broker_customer: PartyId::new("Seller1"),
        }
    }

    #[tokio::test]
    async fn create_invoice_submits_keyed_choice() {
        let d = dispatcher();

        assert_eq!(d.create_invoice(&form()).await, Ok(DispatchOutcome::Submitted));

        let sent = d.ledger().submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].choice, ADD_INVOICE);
        assert_eq!(sent[0].template, SELLER_TEMPLATE);
        assert_eq!(sent[0].key, json!({ "_1": "Operator", "_2": "Seller1" }));
        assert_eq!(sent[0].argument["amount"], json!("100000.5"));
        assert_eq!(sent[0].argument["dueDate"], json!("2021-04-04"));
    }

    #[tokio::test]
    async fn invalid_forms_never_reach_the_ledger() {
        let d = dispatcher();

        let mut empty = form();
        empty.payer = "  ".to_string();
        let mut negative = form();
        negative.amount = "-5".to_string();
        let mut not_a_number = form();
        not_a_number.amount = "1e5".to_string();
        let mut bad_date = form();
        bad_date.issue_date = "04/01/2021".to_string();
        let mut backwards = form();
        backwards.due_date = "2020-12-31".to_string();

        for bad in [empty, negative, not_a_number, bad_date, backwards] {
            let result = d.create_invoice(&bad).await;
            assert!(matches!(result, Err(DispatchError::Validation(_))), "{bad:?} -> {result:?}");
        }
        assert!(d.ledger().submitted().is_empty());
    }

    #[tokio::test]
    async fn ledger_refusal_maps_to_rejected() {
        let d = dispatcher();
        d.ledger().reject_choice(ADD_INVOICE, "invoice already exists");

        assert_eq!(
            d.create_invoice(&form()).await,
            Err(DispatchError::Rejected("invoice already exists".to_string()))
        );
    }

    #[tokio::test]
    async fn send_to_broker_requires_relationship() {
        let d = dispatcher();
        let invoices = Snapshot::new(1, vec![Contract::new(ContractId::new("inv-1"), invoice())]);

        let outcome = d
            .send_to_broker(&ContractId::new("inv-1"), &invoices, &Snapshot::empty())
            .await;

        assert_eq!(outcome, Ok(DispatchOutcome::Skipped(SkipReason::NoBrokerRelationship)));
        assert!(d.ledger().submitted().is_empty());
    }

    #[tokio::test]
    async fn send_to_broker_carries_invoice_payload() {
        let d = dispatcher();
        let invoices = Snapshot::new(1, vec![Contract::new(ContractId::new("inv-1"), invoice())]);
        let relationships = Snapshot::new(1, vec![Contract::new(ContractId::new("rel-1"), relationship())]);

        let missing = d
            .send_to_broker(&ContractId::new("inv-404"), &invoices, &relationships)
            .await;
        assert_eq!(missing, Ok(DispatchOutcome::Skipped(SkipReason::InvoiceNotFound)));

        let sent = d
            .send_to_broker(&ContractId::new("inv-1"), &invoices, &relationships)
            .await;
        assert_eq!(sent, Ok(DispatchOutcome::Submitted));

        let command = &d.ledger().submitted()[0];
        assert_eq!(command.choice, SEND_INVOICE_TO_BROKER);
        assert_eq!(
            command.key,
            json!({ "_1": "Broker1", "_2": "Operator", "_3": "Seller1" })
        );
        assert_eq!(command.argument["invoice"]["invoiceNumber"], json!("ab123"));
    }

    #[tokio::test]
    async fn send_to_auction_validates_terms() {
        let d = dispatcher();
        let contract = Contract::new(ContractId::new("inv-1"), invoice());

        let proceeds = AuctionTerms::minimum_proceeds(
            Decimal::from_str("0.01").unwrap(),
            Decimal::from_str("0.95").unwrap(),
        );
        assert_eq!(proceeds, Decimal::from_str("0.0095").unwrap());

        let terms = AuctionTerms::new("1000", proceeds, "0.01", "2021-05-01");
        assert_eq!(d.send_to_auction(&contract, &terms).await, Ok(DispatchOutcome::Submitted));

        let command = &d.ledger().submitted()[0];
        assert_eq!(command.choice, SEND_INVOICE_TO_AUCTION);
        assert_eq!(command.argument["invoiceCids"], json!(["inv-1"]));
        assert_eq!(command.argument["minimumProceeds"], json!("0.0095"));

        let bad = AuctionTerms::new("1000", proceeds, "0", "2021-05-01");
        assert!(matches!(
            d.send_to_auction(&contract, &bad).await,
            Err(DispatchError::Validation(_))
        ));
        assert_eq!(d.ledger().submitted().len(), 1);
    }

    #[tokio::test]
    async fn detached_dispatch_reports_through_join_handle() {
        let d = Arc::new(dispatcher());
        d.ledger().disconnect_choice(ADD_INVOICE, "connection reset");

        let handle = d.dispatch_detached(CommandIntent::CreateInvoice(form()));

        assert_eq!(
            handle.await.unwrap(),
            Err(DispatchError::Unavailable("connection reset".to_string()))
        );
    }
}
