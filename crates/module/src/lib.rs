//! Confidential ad auction engine.
//!
//! This crate implements the settlement core of a sealed-bid, multi-criterion
//! advertising auction over encrypted values:
//!
//! - Bid intake: encrypted per-criterion weights and encrypted collateral,
//!   both admitted only with verified input proofs
//! - Escrow accounting against a confidential token, pull-based
//! - Homomorphic scoring and private argmax across the full bidder set
//! - Oblivious settlement of the winner's charge, no branching on secrets
//! - A permanent decryption-grant table governing who may ever see what
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Ledger state structures
//! - `escrow`: Per-bidder encrypted deposit accounting
//! - `selector`: Homomorphic scoring and private argmax
//! - `pricing`: Pluggable settlement charge policies
//! - `access`: Decryption grant table
//! - `genesis`: Engine configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use ads_module::{handlers, CallContext, EngineConfig, LedgerState, ScoreCharge};
//!
//! let mut state = LedgerState::new(engine_account);
//! let config = EngineConfig::default();
//! let ctx = CallContext { sender, timestamp };
//!
//! // Register an encrypted bid
//! handlers::handle_bid(&mut state, &mut rt, &mut token, &config, &ctx, &weights, &deposit)?;
//!
//! // Privately select the best bidder for a query
//! let winner = handlers::handle_compute_ad_provider(
//!     &mut state, &mut rt, &config, &ScoreCharge, &ctx, &query,
//! )?;
//! ```

pub mod access;
pub mod call;
pub mod error;
pub mod escrow;
pub mod genesis;
pub mod handlers;
pub mod pricing;
pub mod queries;
pub mod selector;
pub mod state;

pub use access::AccessGateway;
pub use call::EngineCall;
pub use error::EngineError;
pub use genesis::{ConfigValidationError, EngineConfig};
pub use handlers::{CallContext, HandlerResult};
pub use pricing::{FlatCharge, PricingRule, ScoreCharge};
pub use queries::{EngineQuery, EngineQueryResponse};
pub use state::LedgerState;
