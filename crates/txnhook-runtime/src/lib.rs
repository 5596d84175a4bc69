pub mod processor;
pub mod registry;
pub mod shutdown;

pub use processor::{schedule_transaction_processing, schedule_transaction_processing_for_test};
pub use registry::TaskRegistry;
pub use shutdown::ShutdownSignal;
