use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use factoring_core::PartyId;
use factoring_infra::config::{BID_RANKING_VAR, OPERATOR_VAR, PARTY_VAR};
use factoring_infra::projections::AccountingRegime;
use factoring_infra::{
    CommandDispatcher, DispatchOutcome, InMemoryLedger, InvoiceFilter, InvoiceQuery, InvoicesProjection, NewInvoice,
    ProjectionConfig, SnapshotIngestor, SortMode,
};
use factoring_invoicing::{Auction, BrokerCustomerSeller, CanonicalStatus, Invoice};
use factoring_stream::InMemoryContractStream;

struct LedgerStreams {
    invoices: InMemoryContractStream<Invoice>,
    auctions: InMemoryContractStream<Auction>,
    brokers: InMemoryContractStream<BrokerCustomerSeller>,
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn config() -> ProjectionConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        (OPERATOR_VAR, "Operator"),
        (PARTY_VAR, "Seller1"),
        (BID_RANKING_VAR, "highest_price"),
    ]);
    ProjectionConfig::from_lookup(|var| vars.get(var).map(|v| v.to_string())).unwrap()
}

fn invoice(number: &str, amount: &str, status: serde_json::Value) -> Invoice {
    serde_json::from_value(json!({
        "operator": "Operator",
        "payer": format!("Payer {number}"),
        "seller": "Seller1",
        "initialOwner": "Seller1",
        "invoiceNumber": number,
        "amount": amount,
        "issueDate": "2021-01-04",
        "dueDate": "2021-04-04",
        "token": { "label": number },
        "status": status,
    }))
    .unwrap()
}

fn auction(label: &str, status: &str, bids: serde_json::Value) -> Auction {
    serde_json::from_value(json!({
        "token": { "label": label },
        "status": status,
        "minimumPrice": "0.9",
        "minimumQuantity": "100",
        "bidIncrement": "0.01",
        "endDate": "2021-05-01",
        "bids": bids,
    }))
    .unwrap()
}

fn seeded_ledger() -> LedgerStreams {
    let ledger = LedgerStreams {
        invoices: InMemoryContractStream::new(),
        auctions: InMemoryContractStream::new(),
        brokers: InMemoryContractStream::new(),
    };

    ledger.invoices.publish_records([
        ("cid-t1", invoice("T1", "1000.10", json!({ "tag": "InvoiceOpen", "value": {} }))),
        ("cid-t2", invoice("T2", "2500.25", json!({ "tag": "InvoiceLive", "value": {} }))),
        (
            "cid-t3",
            invoice(
                "T3",
                "400.05",
                json!({ "tag": "InvoiceSold", "value": { "soldAt": "2021-05-02T10:00:00Z" } }),
            ),
        ),
    ]);
    ledger.auctions.publish_records([
        // Stale auction sharing T1's label; T1 is still open so it must not join.
        ("cid-a1", auction("T1", "AuctionOpen", json!([]))),
        (
            "cid-a2",
            auction(
                "T2",
                "AuctionOpen",
                json!([
                    { "bidder": "Buyer1", "amount": "100", "price": "0.9" },
                    { "bidder": "Buyer2", "amount": "50", "price": "0.92" },
                ]),
            ),
        ),
        (
            "cid-a3",
            auction(
                "T3",
                "AuctionClosed",
                json!([
                    { "bidder": "Buyer1", "amount": "40", "price": "0.9", "quantityFilled": "40" },
                    { "bidder": "Buyer2", "amount": "60", "price": "0.95", "quantityFilled": "60" },
                ]),
            ),
        ),
    ]);

    ledger
}

#[test]
fn joins_aggregates_and_totals_exactly() {
    let config = config();
    config.init_observability();

    let ledger = seeded_ledger();
    let mut ingestor = SnapshotIngestor::subscribe(&ledger.invoices, &ledger.auctions, &ledger.brokers, &config.party);
    let state = InvoicesProjection::from_config(&config).recompute(&ingestor.current());

    assert!(state.rejected.is_empty());
    let [t1, t2, t3] = [&state.rows[0], &state.rows[1], &state.rows[2]];

    assert!(t1.auction.is_none());
    assert_eq!(t1.aggregate.regime, AccountingRegime::NoAuction);

    assert_eq!(t2.aggregate.regime, AccountingRegime::Open);
    assert_eq!(t2.aggregate.quantity_filled, dec("150"));
    assert_eq!(t2.aggregate.total_proceeds, Decimal::ZERO);
    assert_eq!(t2.aggregate.best_bid.as_ref().unwrap().bidder, PartyId::new("Buyer2"));

    assert_eq!(t3.aggregate.regime, AccountingRegime::Settled);
    assert_eq!(t3.aggregate.quantity_filled, dec("100"));
    assert_eq!(t3.aggregate.total_proceeds, dec("93"));
    assert!(t3.sold_at().is_some());

    let offered = state.query(&InvoiceQuery::new(
        InvoiceFilter::default().with_statuses([CanonicalStatus::Live, CanonicalStatus::Sold]),
        Some(SortMode::AmountDescending),
    ));
    assert_eq!(offered.summary.count, 2);
    assert_eq!(offered.summary.total_amount, dec("2900.30"));
    assert_eq!(offered.rows[0].record().invoice_number, "T2");

    let everything = state.query(&InvoiceQuery::default());
    assert_eq!(everything.summary.total_amount, dec("3900.40"));
    assert_eq!(everything.payers.len(), 3);
}

#[tokio::test]
async fn accepted_commands_surface_only_through_new_snapshots() {
    let config = config();
    let ledger = seeded_ledger();
    let mut ingestor = SnapshotIngestor::subscribe(&ledger.invoices, &ledger.auctions, &ledger.brokers, &config.party);
    let projection = InvoicesProjection::from_config(&config);
    let before = projection.recompute(&ingestor.current());

    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(InMemoryLedger::new()),
        config.operator.clone(),
        config.party.clone(),
    ));
    let outcome = dispatcher
        .create_invoice(&NewInvoice {
            payer: "Payer T4".to_string(),
            invoice_number: "T4".to_string(),
            amount: "99.99".to_string(),
            issue_date: "2021-02-01".to_string(),
            due_date: "2021-03-01".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Submitted);

    let unchanged = projection.recompute(&ingestor.current());
    assert_eq!(unchanged, before);

    let mut contracts = ledger.invoices.current().contracts().to_vec();
    contracts.push(factoring_stream::Contract::new(
        "cid-t4".into(),
        invoice("T4", "99.99", json!({ "tag": "InvoiceOpen", "value": {} })),
    ));
    ledger.invoices.publish(contracts);

    let after = projection.recompute(&ingestor.next().await.unwrap());
    assert_eq!(after.rows.len(), 4);
    assert_eq!(after.revisions.invoices, 2);
    assert_eq!(
        after.query(&InvoiceQuery::default()).summary.total_amount,
        dec("4000.39")
    );
}
