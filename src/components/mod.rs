// Export components
pub mod event_extractor;
pub mod gmail;

// Re-export the two pipeline stages
pub use event_extractor::EventExtractor;
pub use gmail::MailFetcher;
