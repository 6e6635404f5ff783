mod statement;
mod summary;
pub mod views;

pub use statement::statement;
pub use summary::{dashboard, rejection_reason};
pub use views::{ClientStatement, DashboardSummary, RejectionReason};
