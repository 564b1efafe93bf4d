//! Query handlers for the auction engine.
//!
//! These functions provide read-only access to ledger state. Queries return
//! opaque handles at most; decryption still goes through the runtime's grant
//! checks, so nothing here can leak a plaintext.

use ads_types::{EncryptedAddress, Principal, SettlementRecord};
use serde::{Deserialize, Serialize};

use crate::state::LedgerState;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EngineQuery {
    /// Number of principals that have ever bid.
    BidderCount,

    /// Whether a principal has a bid record.
    HasBid { principal: Principal },

    /// Bidder at an insertion-order index.
    GetBidder { index: u64 },

    /// Winner handle from a requester's most recent settlement.
    GetAdProvider { requester: Principal },

    /// Full settlement record for a requester.
    GetSettlement { requester: Principal },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EngineQueryResponse {
    /// Bidder count.
    BidderCount(u64),

    /// Bid record existence.
    HasBid(bool),

    /// Bidder identity, if the index is in range.
    Bidder(Option<Principal>),

    /// Winner handle, if a settlement exists.
    AdProvider(Option<EncryptedAddress>),

    /// Settlement record, if one exists.
    Settlement(Option<SettlementRecord>),
}

/// Handle a query.
pub fn handle_query(state: &LedgerState, query: EngineQuery) -> EngineQueryResponse {
    match query {
        EngineQuery::BidderCount => EngineQueryResponse::BidderCount(state.bidder_count() as u64),

        EngineQuery::HasBid { principal } => {
            EngineQueryResponse::HasBid(state.get_bid(&principal).is_some())
        }

        EngineQuery::GetBidder { index } => {
            EngineQueryResponse::Bidder(state.bidders.get(index as usize).copied())
        }

        EngineQuery::GetAdProvider { requester } => EngineQueryResponse::AdProvider(
            state.get_settlement(&requester).map(|record| record.winner),
        ),

        EngineQuery::GetSettlement { requester } => {
            EngineQueryResponse::Settlement(state.get_settlement(&requester).cloned())
        }
    }
}
