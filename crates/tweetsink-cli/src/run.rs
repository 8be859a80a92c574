//! Wires config, credentials, and clients into one pipeline run.

use std::sync::Arc;

use chrono::Utc;
use tweetsink_core::AppConfig;
use tweetsink_gcp::{BigQueryClient, StorageClient, TokenProvider};
use tweetsink_pipeline::settings::{
    gcp_transport_settings, twitter_client_settings, twitter_credentials,
};
use tweetsink_pipeline::{
    load_job_config, run_pipeline, PipelineError, PipelineSettings, RunSummary, TriggerPayload,
    TwitterSource,
};
use tweetsink_twitter::TwitterClient;

/// Loads the job config, connects both services, and runs the pipeline.
pub(crate) async fn run_once(
    config: &AppConfig,
    trigger: &TriggerPayload,
) -> anyhow::Result<RunSummary> {
    let auth = Arc::new(TokenProvider::from_static_or_metadata(
        config.gcp_access_token.clone(),
    ));
    let transport = gcp_transport_settings(config);

    let storage = StorageClient::new(Arc::clone(&auth), &transport)?;
    let job = load_job_config(&config.config_source, &storage).await?;
    let settings = PipelineSettings::from_config(config, &job)?;

    let credentials = twitter_credentials(&job.twitter)?;
    let client = TwitterClient::connect(credentials, &twitter_client_settings(config))
        .await
        .map_err(PipelineError::Connect)?;
    let source = TwitterSource::new(client, config.timeline_pages_per_account);
    let warehouse = BigQueryClient::new(&job.big_query.project_id, auth, &transport)?;

    let summary = run_pipeline(
        &source,
        &warehouse,
        &settings,
        trigger,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(summary)
}
