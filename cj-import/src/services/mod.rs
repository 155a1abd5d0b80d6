//! Service modules for the journalist import workflow
//!
//! - `admin_client`: remote admin backend (trait + HTTP binding)
//! - `memory_admin`: in-memory backend for dry runs and tests
//! - `batch_importer`: Phase 1, profiles
//! - `image_processor`: Phase 2, email screenshots
//! - `workflow_orchestrator`: both phases for one session

pub mod admin_client;
pub mod batch_importer;
pub mod image_processor;
pub mod memory_admin;
pub mod workflow_orchestrator;

pub use admin_client::{HttpAdminClient, JournalistAdmin, RemoteError};
pub use batch_importer::{BatchImportCoordinator, DEFAULT_BATCH_SIZE};
pub use image_processor::{ImageBatchProcessor, ImageWorkQueue, IMAGE_BATCH_SIZE};
pub use memory_admin::MemoryAdmin;
pub use workflow_orchestrator::ImportWorkflow;
