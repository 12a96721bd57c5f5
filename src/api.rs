use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    DirectOptimizeRequest, DirectOptimizeResponse, Job, JobUpdate, NewJob, NewResume,
    OptimizeRequest, Resume,
};

// --- Store trait ---

/// The REST service that owns jobs and resumes.
pub trait JobStore {
    fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;
    fn create_job(&self, job: &NewJob) -> Result<Job, ApiError>;
    fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError>;
    fn delete_job(&self, id: &str) -> Result<(), ApiError>;
    fn get_resume(&self, id: &str) -> Result<Resume, ApiError>;
    fn create_resume(&self, resume: &NewResume) -> Result<Resume, ApiError>;
    /// Kick off optimization for a stored job. The job list must be refetched afterwards.
    fn optimize(&self, job_id: &str) -> Result<(), ApiError>;
    fn optimize_direct(
        &self,
        request: &DirectOptimizeRequest,
    ) -> Result<DirectOptimizeResponse, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Backend {
        url: String,
        status: u16,
        message: Option<String>,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// The `error` string the backend put in its response body, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Backend { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

// --- HTTP client ---

#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, url: &str, request: reqwest::blocking::RequestBuilder) -> Result<Response, ApiError> {
        debug!(%url, "sending request");
        let response = request.send().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(ApiError::Backend {
            url: url.to_string(),
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }

    fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        response.json().map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl JobStore for ApiClient {
    fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let url = self.url("jobs");
        let response = self.send(&url, self.client.get(&url))?;
        Self::decode(&url, response)
    }

    fn create_job(&self, job: &NewJob) -> Result<Job, ApiError> {
        let url = self.url("jobs");
        let response = self.send(&url, self.client.post(&url).json(job))?;
        Self::decode(&url, response)
    }

    fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError> {
        let url = self.url(&format!("jobs/{}", id));
        let response = self.send(&url, self.client.put(&url).json(update))?;
        Self::decode(&url, response)
    }

    fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("jobs/{}", id));
        self.send(&url, self.client.delete(&url))?;
        Ok(())
    }

    fn get_resume(&self, id: &str) -> Result<Resume, ApiError> {
        let url = self.url(&format!("resumes/{}", id));
        let response = self.send(&url, self.client.get(&url))?;
        Self::decode(&url, response)
    }

    fn create_resume(&self, resume: &NewResume) -> Result<Resume, ApiError> {
        let url = self.url("resumes");
        let response = self.send(&url, self.client.post(&url).json(resume))?;
        Self::decode(&url, response)
    }

    fn optimize(&self, job_id: &str) -> Result<(), ApiError> {
        let url = self.url("optimization/optimize");
        let request = OptimizeRequest {
            job_id: job_id.to_string(),
        };
        self.send(&url, self.client.post(&url).json(&request))?;
        Ok(())
    }

    fn optimize_direct(
        &self,
        request: &DirectOptimizeRequest,
    ) -> Result<DirectOptimizeResponse, ApiError> {
        let url = self.url("optimization/direct");
        let response = self.send(&url, self.client.post(&url).json(request))?;
        Self::decode(&url, response)
    }
}
