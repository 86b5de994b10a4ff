//! A broker's customers, resolved to display profiles.

use tracing::debug;

use factoring_core::PartyId;
use factoring_invoicing::{
    BrokerCustomerBuyer, BrokerCustomerSeller, FactoringRole, Profile, RegistryLookup, WithRole,
};
use factoring_stream::Snapshot;

/// Buyers first, then sellers, each in snapshot order.
///
/// Parties the registry cannot resolve are skipped; a party related in both roles appears once
/// per role.
pub fn broker_users<R>(
    buyers: &Snapshot<BrokerCustomerBuyer>,
    sellers: &Snapshot<BrokerCustomerSeller>,
    registry: &R,
) -> Vec<WithRole<Profile>>
where
    R: RegistryLookup + ?Sized,
{
    let buyer_parties = buyers
        .iter()
        .map(|c| (&c.payload().broker_customer, FactoringRole::Buyer));
    let seller_parties = sellers
        .iter()
        .map(|c| (&c.payload().broker_customer, FactoringRole::Seller));

    buyer_parties
        .chain(seller_parties)
        .filter_map(|(party, role)| resolve(registry, party, role))
        .collect()
}

fn resolve<R>(registry: &R, party: &PartyId, role: FactoringRole) -> Option<WithRole<Profile>>
where
    R: RegistryLookup + ?Sized,
{
    match registry.resolve(party) {
        Some(profile) => Some(WithRole::new(profile, role)),
        None => {
            debug!(party = %party, role = %role, "broker customer not in registry");
            None
        }
    }
}
