//! Exchange-agnostic domain types.
//!
//! Value types shared by the ledger cache and the reconstruction
//! services. Everything here is plain data: no I/O, no clocks, no
//! dependencies on the collaborator ports.

pub mod balance;
pub mod fill;
pub mod id;
pub mod money;
pub mod order;
pub mod pair;
pub mod position;
pub mod side;
pub mod time;
pub mod trade;

pub use balance::{AssetBalance, BalanceSheet};
pub use fill::Fill;
pub use id::{FillId, OrderId, TradeId};
pub use money::{Amount, Price, Volume};
pub use order::{Order, OrderStatus};
pub use pair::Pair;
pub use position::Position;
pub use side::Side;
pub use time::TimeRange;
pub use trade::TradeRecord;
