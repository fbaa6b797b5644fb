//! Power system: levels derived from steps, per-entity records and level-ups

mod ledger;
mod mapper;
mod session;

pub use ledger::{EntityId, EntityTracker, LevelOrigin, LevelUp, PowerLedger, PowerRecord};
pub use mapper::{PowerMapper, PowerSnapshot};
pub use session::{EntityPower, PowerEvent, PowerSession};
