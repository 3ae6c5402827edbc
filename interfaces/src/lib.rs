pub mod defs;
pub mod empty;

pub use defs::BilingualSummary;
pub use defs::Paper;
pub use defs::ProgressReporter;
pub use defs::SummaryStatus;
pub use defs::TokenUsage;
pub use empty::EmptyProgress;
