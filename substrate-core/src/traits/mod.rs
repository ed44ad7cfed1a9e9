mod backend;
mod clock;
mod failure_log;
mod mechanism;

pub use backend::GraphBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use failure_log::{FailureEntry, FailureLog};
pub use mechanism::{Mechanism, MechanismStatus};
