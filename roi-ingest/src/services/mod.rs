//! Services for roi-ingest

pub mod dashboard_store;
pub mod ingestion;
pub mod predictor_client;

pub use dashboard_store::DashboardStore;
pub use ingestion::{IngestionService, UploadTicket};
pub use predictor_client::{
    FileUpload, Predictor, PredictorClient, PredictorError, PredictorHealth, PredictorResponse,
    TransferProgress,
};
