use crate::api::gfy::GfyApi;
use crate::client::{Client, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::models::gfy::Gfy;
use crate::models::upload::*;
use async_trait::async_trait;
use reqwest::{Body, Method};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest wait between two status polls
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upload API methods
#[async_trait]
pub trait UploadApi {
    /// Reserve a gfy name to upload media under
    async fn create_upload_key(&self, params: &GfyCreationParameters) -> ApiResult<UploadKey>;

    /// Stream media to the drop host under the key's name.
    ///
    /// The drop host takes no credentials. Cancelling `cancel` aborts the
    /// transfer with [`ApiError::Cancelled`].
    async fn upload_file(
        &self,
        key: &UploadKey,
        body: Body,
        cancel: Option<CancellationToken>,
    ) -> ApiResult<()>;

    /// Upload a local file, streaming it from disk
    async fn upload_from_path(
        &self,
        key: &UploadKey,
        path: &Path,
        cancel: Option<CancellationToken>,
    ) -> ApiResult<()>;

    /// Processing status of an upload
    async fn get_upload_status(&self, name: &str) -> ApiResult<GfyStatus>;
}

#[async_trait]
impl UploadApi for Client {
    async fn create_upload_key(&self, params: &GfyCreationParameters) -> ApiResult<UploadKey> {
        let key: UploadKey = self.post("/gfycats", params, RequestOptions::new()).await?;
        debug!(target: "api::upload", name = %key.name, "Upload key issued");
        Ok(key)
    }

    async fn upload_file(
        &self,
        key: &UploadKey,
        body: Body,
        cancel: Option<CancellationToken>,
    ) -> ApiResult<()> {
        let endpoint = format!(
            "{}/{}",
            self.config().upload_url.trim_end_matches('/'),
            urlencoding::encode(&key.name)
        );
        let mut opts = RequestOptions::new().no_credential();
        if let Some(token) = cancel {
            opts = opts.with_cancellation(token);
        }

        info!(target: "api::upload", name = %key.name, "Uploading media");
        let status = self
            .upload_stream(Method::PUT, &endpoint, body, &key.name, opts)
            .await?;

        if !status.is_success() {
            warn!(target: "api::upload", name = %key.name, status = %status, "Upload rejected");
            return Err(ApiError::Api {
                status,
                code: "UploadFailed".to_string(),
                description: format!("drop host refused {}", key.name),
            });
        }
        Ok(())
    }

    async fn upload_from_path(
        &self,
        key: &UploadKey,
        path: &Path,
        cancel: Option<CancellationToken>,
    ) -> ApiResult<()> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            ApiError::InvalidArgument(format!("cannot open {}: {}", path.display(), e))
        })?;
        let body = Body::wrap_stream(ReaderStream::new(file));
        self.upload_file(key, body, cancel).await
    }

    async fn get_upload_status(&self, name: &str) -> ApiResult<GfyStatus> {
        let mut status: GfyStatus = self
            .get(
                &format!("/gfycats/fetch/status/{}", urlencoding::encode(name)),
                RequestOptions::new().no_credential(),
            )
            .await?;
        if status.name.is_none() {
            status.name = Some(name.to_string());
        }
        Ok(status)
    }
}

impl GfyStatus {
    pub fn is_complete(&self) -> bool {
        self.task == UploadTask::Complete
    }

    /// Re-fetch the status in place
    pub async fn update(&mut self, client: &Client) -> ApiResult<()> {
        let name = self.gfy_name()?.to_string();
        let latest = client.get_upload_status(&name).await?;
        self.task = latest.task;
        self.time = latest.time;
        self.error_description = latest.error_description;
        if latest.name.is_some() {
            self.name = latest.name;
        }
        Ok(())
    }

    /// The finished gfy; fails unless processing is complete
    pub async fn get_gfy(&self, client: &Client) -> ApiResult<Gfy> {
        if !self.is_complete() {
            return Err(ApiError::UploadIncomplete(self.describe()));
        }
        client.get_gfy(self.gfy_name()?).await
    }

    /// Poll until the server stops encoding, then fetch the gfy.
    ///
    /// Waits the interval suggested by the server between polls.
    pub async fn wait_until_complete(&mut self, client: &Client) -> ApiResult<Gfy> {
        while self.task == UploadTask::Encoding {
            let wait = Duration::from_secs(self.time).max(MIN_POLL_INTERVAL);
            debug!(target: "api::upload", name = ?self.name, ?wait, "Still encoding");
            tokio::time::sleep(wait).await;
            self.update(client).await?;
        }
        self.get_gfy(client).await
    }

    fn gfy_name(&self) -> ApiResult<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| ApiError::InvalidArgument("upload status carries no gfy name".to_string()))
    }

    fn describe(&self) -> String {
        match &self.error_description {
            Some(description) => format!("{:?}: {}", self.task, description),
            None => format!("{:?}", self.task),
        }
    }
}
