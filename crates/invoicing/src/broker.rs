use serde::{Deserialize, Serialize};

use factoring_core::PartyId;

/// A seller that has signed up with a broker.
///
/// Key: `(broker, operator, broker_customer)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerCustomerSeller {
    pub broker: PartyId,
    pub operator: PartyId,
    pub broker_customer: PartyId,
}

/// A buyer that has signed up with a broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerCustomerBuyer {
    pub broker: PartyId,
    pub operator: PartyId,
    pub broker_customer: PartyId,
}
