//! Intent handlers, one per entity family

mod common;
mod key_result;
mod key_result_task;
mod objective;
mod okr_session;
mod team;
mod user;

pub use key_result::{KeyResultHandler, KeyResultIntent};
pub use key_result_task::{KeyResultTaskHandler, KeyResultTaskIntent};
pub use objective::{ObjectiveHandler, ObjectiveIntent};
pub use okr_session::{OkrSessionHandler, OkrSessionIntent};
pub use team::{TeamHandler, TeamIntent};
pub use user::{UserHandler, UserIntent};
