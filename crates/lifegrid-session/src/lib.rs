#![deny(missing_docs)]

//! Session layer of the lifegrid engine.
//!
//! An [`AnalysisSession`] is one caller's mutable workspace, carrying a
//! dataset from load through clustering, view projection, pattern
//! mining, and project round trips. The [`SessionStore`] keeps many
//! such workspaces behind opaque hex ids, capping how many exist at
//! once and expiring the ones nobody has touched for a while.

mod session;
mod store;

pub use session::{AnalysisSession, MemberShare};
pub use store::{SessionLimits, SessionStore};
