// Application layer - Use case interactors

pub mod container;
pub mod export_job;
pub mod trim_interactor;

// Re-export interactors
pub use container::DefaultAppContainer;
pub use export_job::ExportHandle;
pub use trim_interactor::{SessionSettings, TrimInteractor, TrimPorts};
