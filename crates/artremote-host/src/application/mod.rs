//! Application layer: session state, shortcut-table caching, and command
//! dispatch.  Depends on the infrastructure traits (detector, emitter,
//! shortcut sources) but never on the platform code behind them.

pub mod cache;
pub mod dispatch;
pub mod sessions;
