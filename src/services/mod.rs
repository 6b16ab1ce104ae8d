// Lifecycle core
pub mod batch_reconciler;
pub mod status;
pub mod stocking_events;

// Collaborators
pub mod geometry;
pub mod notifications;
pub mod reference_data;
pub mod settings;
