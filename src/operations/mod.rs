pub mod cleanup;

pub use cleanup::{CleanupOperation, CleanupOptions};
