
mod processor;

pub use processor::{run_forever, CycleSummary, DeliveryProcessor, FileOutcome, Scheduler, SkipReason};
