//! Process configuration, read from environment variables.
//!
//! | variable                | required | values                          |
//! |-------------------------|----------|---------------------------------|
//! | `FACTORING_OPERATOR`    | yes      | operator party                  |
//! | `FACTORING_PARTY`       | yes      | viewing party                   |
//! | `FACTORING_ROLE`        | no       | `seller` (default), `buyer`, ...|
//! | `FACTORING_BID_RANKING` | yes      | `lowest_price`, `highest_price` |
//! | `FACTORING_LOG_FORMAT`  | no       | `json` (default), `pretty`      |

use thiserror::Error;

use factoring_core::PartyId;
use factoring_invoicing::FactoringRole;
use factoring_observability::LogFormat;

use crate::projections::bid_aggregator::PriceRanking;
use crate::projections::invoices_view::Viewer;

pub const OPERATOR_VAR: &str = "FACTORING_OPERATOR";
pub const PARTY_VAR: &str = "FACTORING_PARTY";
pub const ROLE_VAR: &str = "FACTORING_ROLE";
pub const BID_RANKING_VAR: &str = "FACTORING_BID_RANKING";
pub const LOG_FORMAT_VAR: &str = "FACTORING_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything needed to build the invoice projection for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionConfig {
    pub operator: PartyId,
    pub party: PartyId,
    pub role: FactoringRole,
    pub bid_ranking: PriceRanking,
    pub log_format: LogFormat,
}

impl ProjectionConfig {
    pub fn new(operator: PartyId, party: PartyId, bid_ranking: PriceRanking) -> Self {
        Self {
            operator,
            party,
            role: FactoringRole::Seller,
            bid_ranking,
            log_format: LogFormat::default(),
        }
    }

    pub fn with_role(mut self, role: FactoringRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let operator = parse_party(OPERATOR_VAR, &required(OPERATOR_VAR)?)?;
        let party = parse_party(PARTY_VAR, &required(PARTY_VAR)?)?;
        let bid_ranking = required(BID_RANKING_VAR)?
            .parse::<PriceRanking>()
            .map_err(|e| invalid(BID_RANKING_VAR, e))?;

        let mut config = Self::new(operator, party, bid_ranking);

        if let Some(role) = lookup(ROLE_VAR) {
            config.role = role
                .parse::<FactoringRole>()
                .map_err(|e| invalid(ROLE_VAR, e))?;
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            config.log_format = format
                .parse::<LogFormat>()
                .map_err(|e| invalid(LOG_FORMAT_VAR, e))?;
        }

        Ok(config)
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.party.clone(), self.operator.clone(), self.role)
    }

    /// Install the process-wide tracing subscriber in the configured format.
    pub fn init_observability(&self) {
        factoring_observability::init_with(self.log_format);
    }
}

fn parse_party(var: &'static str, raw: &str) -> Result<PartyId, ConfigError> {
    raw.trim().parse::<PartyId>().map_err(|e| invalid(var, e))
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn loads_required_and_defaults() {
        let config = ProjectionConfig::from_lookup(lookup(&[
            (OPERATOR_VAR, "Operator"),
            (PARTY_VAR, "Seller1"),
            (BID_RANKING_VAR, "highest_price"),
        ]))
        .unwrap();

        assert_eq!(config.operator, PartyId::new("Operator"));
        assert_eq!(config.role, FactoringRole::Seller);
        assert_eq!(config.bid_ranking, PriceRanking::HighestPrice);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.viewer().party, PartyId::new("Seller1"));
    }

    #[test]
    fn bid_ranking_has_no_default() {
        let err = ProjectionConfig::from_lookup(lookup(&[
            (OPERATOR_VAR, "Operator"),
            (PARTY_VAR, "Seller1"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing(BID_RANKING_VAR));
    }

    #[test]
    fn rejects_unknown_values() {
        let err = ProjectionConfig::from_lookup(lookup(&[
            (OPERATOR_VAR, "Operator"),
            (PARTY_VAR, "Broker1"),
            (BID_RANKING_VAR, "lowest_price"),
            (ROLE_VAR, "auditor"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { var: ROLE_VAR, .. }));
    }

    #[test]
    fn optional_values_override_defaults() {
        let config = ProjectionConfig::from_lookup(lookup(&[
            (OPERATOR_VAR, "Operator"),
            (PARTY_VAR, "Broker1"),
            (BID_RANKING_VAR, "lowest_price"),
            (ROLE_VAR, "broker"),
            (LOG_FORMAT_VAR, "pretty"),
        ]))
        .unwrap();

        assert_eq!(config.role, FactoringRole::Broker);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
