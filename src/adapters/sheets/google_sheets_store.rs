//! Google Sheets lead store.
//!
//! Appends one row per lead with `values:append`. The spreadsheet is
//! addressed by id when configured, otherwise looked up by name through
//! the Drive API once and remembered.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::lead::LeadRecord;
use crate::ports::{LeadStore, LeadStoreError};

use super::service_account::AccessTokenSource;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    /// Spreadsheet title, used when no id is configured.
    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
    /// Worksheet title; the first sheet when absent.
    pub worksheet: Option<String>,
    pub sheets_base_url: String,
    pub drive_base_url: String,
    pub request_timeout: Duration,
}

impl GoogleSheetsConfig {
    pub fn new(spreadsheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_name: spreadsheet_name.into(),
            spreadsheet_id: None,
            worksheet: None,
            sheets_base_url: "https://sheets.googleapis.com/v4".to_string(),
            drive_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_spreadsheet_id(mut self, id: Option<String>) -> Self {
        self.spreadsheet_id = id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn with_worksheet(mut self, worksheet: Option<String>) -> Self {
        self.worksheet = worksheet.filter(|w| !w.trim().is_empty());
        self
    }

    pub fn with_base_urls(mut self, sheets: impl Into<String>, drive: impl Into<String>) -> Self {
        self.sheets_base_url = sheets.into();
        self.drive_base_url = drive.into();
        self
    }

    /// A1 range the append targets.
    fn append_range(&self) -> String {
        match &self.worksheet {
            Some(sheet) => format!("'{}'!A1", sheet.replace('\'', "''")),
            None => "A1".to_string(),
        }
    }
}

pub struct GoogleSheetsLeadStore {
    config: GoogleSheetsConfig,
    tokens: Arc<dyn AccessTokenSource>,
    client: Client,
    resolved_id: RwLock<Option<String>>,
}

impl GoogleSheetsLeadStore {
    pub fn new(config: GoogleSheetsConfig, tokens: Arc<dyn AccessTokenSource>, client: Client) -> Self {
        let resolved_id = RwLock::new(config.spreadsheet_id.clone());
        Self {
            config,
            tokens,
            client,
            resolved_id,
        }
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<Response, LeadStoreError> {
        let token = self.tokens.access_token().await?;
        let timeout_secs = self.config.request_timeout.as_secs();

        builder
            .bearer_auth(token)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeadStoreError::Timeout(timeout_secs)
                } else {
                    LeadStoreError::Unreachable(e.to_string())
                }
            })
    }

    async fn spreadsheet_id(&self) -> Result<String, LeadStoreError> {
        if let Some(id) = self.resolved_id.read().await.clone() {
            return Ok(id);
        }

        let name = &self.config.spreadsheet_name;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let url = endpoint(&self.config.drive_base_url, &["files"])?;

        let response = self
            .authorized(self.client.get(url).query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
            ]))
            .await?;
        let response = check_status(response, name).await?;

        let listing: FileList = response
            .json()
            .await
            .map_err(|e| LeadStoreError::Unreachable(format!("unexpected Drive response: {}", e)))?;

        let id = listing
            .files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| LeadStoreError::SpreadsheetNotFound(name.clone()))?;

        tracing::debug!(spreadsheet = %name, id = %id, "Resolved spreadsheet id");
        *self.resolved_id.write().await = Some(id.clone());
        Ok(id)
    }
}

#[async_trait]
impl LeadStore for GoogleSheetsLeadStore {
    async fn append(&self, record: &LeadRecord) -> Result<(), LeadStoreError> {
        let id = self.spreadsheet_id().await?;
        let range = format!("{}:append", self.config.append_range());
        let url = endpoint(
            &self.config.sheets_base_url,
            &["spreadsheets", id.as_str(), "values", range.as_str()],
        )?;

        let body = serde_json::json!({ "values": [record.to_row()] });
        let response = self
            .authorized(
                self.client
                    .post(url)
                    .query(&[
                        ("valueInputOption", "USER_ENTERED"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&body),
            )
            .await?;

        check_status(response, &self.config.spreadsheet_name).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("google-sheets:{}", self.config.spreadsheet_name)
    }
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, LeadStoreError> {
    let mut url =
        Url::parse(base).map_err(|e| LeadStoreError::Unreachable(format!("bad base url: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| LeadStoreError::Unreachable(format!("bad base url: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: Response, spreadsheet: &str) -> Result<Response, LeadStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LeadStoreError::AuthenticationFailed(format!("{}: {}", status, body))
        }
        StatusCode::NOT_FOUND => LeadStoreError::SpreadsheetNotFound(spreadsheet.to_string()),
        _ => LeadStoreError::Rejected {
            status: status.as_u16(),
            message: body,
        },
    })
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}
