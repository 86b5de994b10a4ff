use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use factoring_core::{CalendarDate, ContractId, Numeric, PartyId};
use factoring_infra::projections::{BidAggregator, PriceRanking};
use factoring_infra::{InvoiceFilter, InvoiceQuery, InvoicesProjection, SnapshotTriple, SortMode, Viewer};
use factoring_invoicing::{Auction, AuctionStatus, Bid, FactoringRole, Invoice, RawStatus, Token};
use factoring_stream::{Contract, Snapshot};

const TAGS: [&str; 3] = ["InvoiceOpen", "InvoiceLive", "InvoicePooled"];

fn snapshots(count: usize) -> SnapshotTriple {
    let invoices = (0..count)
        .map(|i| {
            Contract::new(
                ContractId::new(format!("inv-{i}")),
                Invoice {
                    operator: PartyId::new("Operator"),
                    payer: PartyId::new(format!("Payer{}", i % 17)),
                    seller: PartyId::new("Seller1"),
                    initial_owner: PartyId::new("Seller1"),
                    invoice_number: format!("N{i}"),
                    amount: Numeric::new(format!("{}.{:02}", 1_000 + i, i % 100)),
                    issue_date: CalendarDate::from("2021-01-01"),
                    due_date: CalendarDate::new(format!("2021-{:02}-{:02}", 1 + i % 12, 1 + i % 28)),
                    token: Token::new(format!("tok-{i}")),
                    status: RawStatus::new(TAGS[i % TAGS.len()], serde_json::json!({})),
                },
            )
        })
        .collect();

    let auctions = (0..count)
        .filter(|i| i % TAGS.len() != 0)
        .map(|i| {
            let bids = (0..8)
                .map(|b| Bid::new(format!("Buyer{b}"), "100", &format!("0.9{b}"), "50"))
                .collect();
            Contract::new(
                ContractId::new(format!("auc-{i}")),
                Auction {
                    token: Token::new(format!("tok-{i}")),
                    status: if i % 2 == 0 { AuctionStatus::Open } else { AuctionStatus::Closed },
                    minimum_price: Numeric::from("0.9"),
                    minimum_quantity: Numeric::from("100"),
                    bid_increment: Numeric::from("0.01"),
                    end_date: CalendarDate::from("2021-06-01"),
                    bids,
                },
            )
        })
        .collect();

    SnapshotTriple::new(Snapshot::new(1, invoices), Snapshot::new(1, auctions), Snapshot::empty())
}

fn projection() -> InvoicesProjection {
    InvoicesProjection::new(
        Viewer::new(PartyId::new("Seller1"), PartyId::new("Operator"), FactoringRole::Seller),
        BidAggregator::with_ranking(PriceRanking::HighestPrice),
    )
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_recompute");
    let projection = projection();

    for count in [100usize, 1_000, 10_000] {
        let triple = snapshots(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("join_aggregate", count), &triple, |b, triple| {
            b.iter(|| black_box(projection.recompute(black_box(triple))))
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_query");
    let state = projection().recompute(&snapshots(10_000));
    let query = InvoiceQuery::new(
        InvoiceFilter::default().with_payer(PartyId::new("Payer3")),
        Some(SortMode::DueDateDescending),
    );

    group.bench_function("filter_sort_summary", |b| {
        b.iter(|| black_box(state.query(black_box(&query))))
    });
    group.bench_function("wildcard_amount_sort", |b| {
        let all = InvoiceQuery::new(InvoiceFilter::default(), Some(SortMode::AmountAscending));
        b.iter(|| black_box(state.query(black_box(&all))))
    });

    group.finish();
}

criterion_group!(benches, bench_recompute, bench_query);
criterion_main!(benches);
