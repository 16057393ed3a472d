//! The `Logger` seam

/// Sink for the human-readable messages components emit
///
/// Every connection, registry, composer and session holds an
/// `Arc<dyn Logger>` and prefixes its messages with `[Component]`.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}
