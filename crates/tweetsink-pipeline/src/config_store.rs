use tweetsink_core::{ConfigSource, JobConfig};
use tweetsink_gcp::StorageClient;

use crate::error::PipelineError;

/// Loads the job config document from Cloud Storage or local disk.
///
/// # Errors
///
/// Returns [`PipelineError::ConfigStore`] if the object cannot be downloaded,
/// or [`PipelineError::Config`] if the document is unreadable or invalid.
pub async fn load_job_config(
    source: &ConfigSource,
    storage: &StorageClient,
) -> Result<JobConfig, PipelineError> {
    let config = match source {
        ConfigSource::Gcs { bucket, object } => {
            let bytes = storage.download(bucket, object).await.map_err(|e| {
                PipelineError::ConfigStore {
                    location: source.to_string(),
                    source: e,
                }
            })?;
            JobConfig::from_slice(&bytes)?
        }
        ConfigSource::File(path) => JobConfig::from_file(path)?,
    };

    tracing::info!(
        source = %source,
        dataset = %config.big_query.dataset_id,
        insert_table = %config.big_query.insert_table,
        "loaded job config"
    );
    Ok(config)
}
