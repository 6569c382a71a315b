pub mod document_cleanup;

pub use document_cleanup::DocumentCleanupWorker;
