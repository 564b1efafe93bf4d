//! Ledger state structures for the auction engine.
//!
//! Every public entry point reads the full prior state and commits atomically
//! through `&mut` access; there is no interior locking and no partial commit.

use std::collections::HashMap;

use ads_types::{BidRecord, Principal, SettlementRecord};

use crate::access::AccessGateway;

/// Auction engine ledger.
#[derive(Debug)]
pub struct LedgerState {
    /// Token account under which this engine escrows pulled collateral.
    pub engine: Principal,

    /// Every principal that has ever bid, in insertion order. Append-only:
    /// withdrawn bidders stay listed with a zeroed deposit and stale weights,
    /// since no plaintext signal exists to decide whether to prune.
    pub bidders: Vec<Principal>,

    /// Bid records by owner. At most one per principal.
    pub bids: HashMap<Principal, BidRecord>,

    /// Most recent winner selection per requester.
    pub settlements: HashMap<Principal, SettlementRecord>,

    /// Decryption grant table.
    pub access: AccessGateway,
}

impl LedgerState {
    /// Create an empty ledger for the given engine token account.
    pub fn new(engine: Principal) -> Self {
        Self {
            engine,
            bidders: Vec::new(),
            bids: HashMap::new(),
            settlements: HashMap::new(),
            access: AccessGateway::new(),
        }
    }

    /// Number of principals that have ever bid.
    pub fn bidder_count(&self) -> usize {
        self.bidders.len()
    }

    /// Whether `principal` is already listed in the bidder set.
    pub fn is_bidder(&self, principal: &Principal) -> bool {
        self.bidders.contains(principal)
    }

    /// Append `principal` to the bidder set unless already present.
    pub fn record_bidder(&mut self, principal: Principal) {
        if !self.is_bidder(&principal) {
            self.bidders.push(principal);
        }
    }

    /// Get a bid record by owner.
    pub fn get_bid(&self, principal: &Principal) -> Option<&BidRecord> {
        self.bids.get(principal)
    }

    /// Get a mutable bid record by owner.
    pub fn get_bid_mut(&mut self, principal: &Principal) -> Option<&mut BidRecord> {
        self.bids.get_mut(principal)
    }

    /// Most recent settlement for `requester`, if any.
    pub fn get_settlement(&self, requester: &Principal) -> Option<&SettlementRecord> {
        self.settlements.get(requester)
    }
}
