//! Core domain types: bars, candidates, orders, positions, trades, ledgers.

pub mod bar;
pub mod candidate;
pub mod ledger;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use candidate::{rank_candidates, Candidate};
pub use ledger::{EquityPoint, Ledger};
pub use order::{Fill, Order, OrderSide};
pub use position::Position;
pub use trade::TradeRecord;
