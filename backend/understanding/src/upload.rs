//! Temporary-storage upload for local video files.
//!
//! The generation endpoint cannot read files on the caller's disk. Local files
//! are first pushed to DashScope's temporary OSS bucket under a short-lived
//! upload policy, and the request then refers to them by `oss://` URL.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use vidlens_core::{Result, VidlensError};

/// Header telling the generation endpoint to resolve `oss://` references.
pub const OSS_RESOLVE_HEADER: &str = "X-DashScope-OssResourceResolve";

/// Upload credentials granted for one model.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPolicy {
    pub policy: String,
    pub signature: String,
    pub upload_dir: String,
    pub upload_host: String,
    pub oss_access_key_id: String,
    pub x_oss_object_acl: String,
    pub x_oss_forbid_overwrite: String,
    #[serde(default)]
    pub max_file_size_mb: Option<f64>,
}

#[derive(Deserialize)]
struct PolicyEnvelope {
    data: Option<UploadPolicy>,
    message: Option<String>,
}

/// Ask the API for an upload policy scoped to `model`.
pub async fn fetch_policy(
    client: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
) -> Result<UploadPolicy> {
    let response = client
        .get(format!("{base_url}/uploads"))
        .query(&[("action", "getPolicy"), ("model", model)])
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|e| VidlensError::Transport(format!("Upload policy request failed: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| VidlensError::Transport(format!("Failed to read upload policy: {e}")))?;
    let envelope: Option<PolicyEnvelope> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let message = envelope
            .and_then(|e| e.message)
            .unwrap_or_else(|| text.trim().to_string());
        return Err(VidlensError::RemoteService {
            status_code: status.as_u16(),
            message,
        });
    }

    envelope
        .and_then(|e| e.data)
        .ok_or_else(|| VidlensError::Extraction("upload policy response has no data".into()))
}

/// Upload `path` under `policy` and return its `oss://` URL.
pub async fn upload_file(client: &Client, policy: &UploadPolicy, path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| VidlensError::InvalidReference {
            reference: path.display().to_string(),
            reason: "file name is not valid UTF-8".into(),
        })?
        .to_string();

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        VidlensError::Other(anyhow::Error::new(e).context(format!("Failed to read {}", path.display())))
    })?;

    if let Some(limit_mb) = policy.max_file_size_mb {
        if bytes.len() as f64 > limit_mb * 1024.0 * 1024.0 {
            return Err(VidlensError::InvalidReference {
                reference: path.display().to_string(),
                reason: format!("file exceeds the {limit_mb} MB upload limit"),
            });
        }
    }

    let key = format!("{}/{}", policy.upload_dir, file_name);
    info!(file = %file_name, size = bytes.len(), "Uploading local video");

    let form = Form::new()
        .text("OSSAccessKeyId", policy.oss_access_key_id.clone())
        .text("Signature", policy.signature.clone())
        .text("policy", policy.policy.clone())
        .text("key", key.clone())
        .text("x-oss-object-acl", policy.x_oss_object_acl.clone())
        .text("x-oss-forbid-overwrite", policy.x_oss_forbid_overwrite.clone())
        .text("success_action_status", "200")
        .part("file", Part::bytes(bytes).file_name(file_name));

    let response = client
        .post(&policy.upload_host)
        .multipart(form)
        .send()
        .await
        .map_err(|e| VidlensError::Transport(format!("File upload failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VidlensError::RemoteService {
            status_code: status.as_u16(),
            message: body.trim().to_string(),
        });
    }

    debug!(key = %key, "Local video uploaded");
    Ok(format!("oss://{key}"))
}
