//! stepdex - step-powered creature catalog core
//!
//! Walking powers up the creatures in your catalog. stepdex holds the parts
//! of that loop that are not UI:
//!
//! 1. **Pedometer**: counts steps from a platform step counter or from raw
//!    accelerometer samples and keeps a lifetime total that survives restarts.
//! 2. **Power mapping**: every `steps_per_level` steps is one power level.
//! 3. **Power ledger**: each creature remembers the level it last reached and
//!    levels up (once) when the global level passes it.
//!
//! Rendering, navigation and fetching the catalog itself belong to the host
//! application.

pub mod config;
pub mod pedometer;
pub mod power;
pub mod storage;
