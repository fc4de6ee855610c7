use super::Payload;
use crate::config::Report;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Outcome of a toll API call. Only ever logged by the controllers.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Delivery {
    Accepted { status: u16, body: String },
    Rejected { status: u16, body: String },
    Failed { reason: String },
}

/// Prints trigger payloads and posts them to the toll API.
///
/// Posting happens on a detached tokio task. Whatever goes wrong there is
/// logged and dropped; the control loop never waits for it and nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    url: String,
}

impl Reporter {
    pub fn new(report: &Report) -> Result<Reporter> {
        let client = reqwest::Client::builder()
            .timeout(report.timeout())
            .build()?;

        Ok(Reporter {
            client,
            url: report.api_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Writes the payload to stdout, which doubles as the audit log.
    pub fn log<P: Payload>(payload: &P) {
        println!("{}", payload.audit_line());
    }

    /// Starts the POST in the background and returns immediately.
    ///
    /// Dropping the handle detaches the task.
    pub fn dispatch<P>(&self, payload: P) -> JoinHandle<Delivery>
    where
        P: Payload + Send + Sync + 'static,
    {
        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(async move { post(&client, &url, &payload).await })
    }
}

async fn post<P: Payload>(client: &reqwest::Client, url: &str, payload: &P) -> Delivery {
    let body = match serde_json::to_string(payload) {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "Cannot serialize toll payload");
            return Delivery::Failed {
                reason: err.to_string(),
            };
        }
    };

    info!(url, "Sending data to API...");

    let response = match client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            if err.is_timeout() {
                warn!(url, "Toll API did not answer in time");
            } else {
                warn!(url, error = %err, "Failed to send data");
            }
            return Delivery::Failed {
                reason: err.to_string(),
            };
        }
    };

    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            warn!(status, error = %err, "Cannot read toll API response body");
            String::new()
        }
    };

    if (200..300).contains(&status) {
        info!(status, body = %body, "API response");
        Delivery::Accepted { status, body }
    } else {
        warn!(status, body = %body, "Toll API rejected payload");
        Delivery::Rejected { status, body }
    }
}
