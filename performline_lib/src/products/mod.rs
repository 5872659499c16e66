//! Per-product accessors. Each service borrows the [`crate::Client`]'s REST
//! client and exposes one list/get pair per resource.

pub mod callcenter;
pub mod chatscout;
pub mod common;
pub mod web;

pub use callcenter::CallCenter;
pub use chatscout::ChatScout;
pub use common::Common;
pub use web::Web;
