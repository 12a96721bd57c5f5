use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    InProgress,
    Optimized,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::InProgress => "In Progress",
            JobStatus::Optimized => "Optimized",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Anything the backend sends that we don't recognize renders as pending.
impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "Optimized" => JobStatus::Optimized,
            "In Progress" => JobStatus::InProgress,
            _ => JobStatus::Pending,
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(JobStatus::from(raw.as_str()))
    }
}

/// Reference to a stored resume.
///
/// The store returns either the bare id or the populated resume document,
/// depending on the endpoint. Both collapse to the id here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRef(pub String);

impl ResumeRef {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResumeRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl<'de> Deserialize<'de> for ResumeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawResumeRef::deserialize(deserializer)? {
            RawResumeRef::Id(id) => ResumeRef(id),
            RawResumeRef::Populated { id } => ResumeRef(id),
        })
    }
}

impl Serialize for ResumeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_name: String,
    pub company_name: String,
    pub position: String,
    pub job_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_link: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_on: Option<DateTime<Utc>>,
    pub base_resume_id: ResumeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_resume_id: Option<ResumeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>, // summary from the optimization backend
}

impl Job {
    pub fn is_optimized(&self) -> bool {
        self.status == JobStatus::Optimized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeVersion {
    Base,
    #[allow(dead_code)] // only the optimization backend creates these
    Optimized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub version: String, // "base", "optimized"
}

// --- Request payloads ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResume {
    pub client_name: String,
    pub content: String,
    pub version: ResumeVersion,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub client_name: String,
    pub company_name: String,
    pub position: String,
    pub job_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_link: Option<String>,
    pub base_resume_id: String,
}

/// Partial job update; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_resume: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectOptimizeRequest {
    pub base_resume: String,
    pub job_description: String,
    pub client_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectOptimizeResponse {
    pub optimized_resume: String,
    #[serde(default)]
    pub changes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_decodes_populated_resume_refs() {
        let job: Job = serde_json::from_value(json!({
            "_id": "j1",
            "clientName": "Ada",
            "companyName": "Acme",
            "position": "Engineer",
            "jobDescription": "Build things",
            "status": "Optimized",
            "optimizedOn": "2024-03-01T12:00:00Z",
            "baseResumeId": { "_id": "r1", "content": "ignored" },
            "optimizedResumeId": "r2",
            "changes": "* **Skills:** Added Rust."
        }))
        .unwrap();

        assert_eq!(job.base_resume_id.id(), "r1");
        assert_eq!(job.optimized_resume_id.as_ref().map(ResumeRef::id), Some("r2"));
        assert!(job.is_optimized());
        assert!(job.optimized_on.is_some());
    }

    #[test]
    fn test_job_status_variants() {
        assert_eq!(JobStatus::from("In Progress"), JobStatus::InProgress);
        assert_eq!(JobStatus::from("Optimized"), JobStatus::Optimized);
        assert_eq!(JobStatus::from("Archived"), JobStatus::Pending);
        assert_eq!(serde_json::to_value(JobStatus::InProgress).unwrap(), json!("In Progress"));
    }

    #[test]
    fn test_minimal_pending_job() {
        let job: Job = serde_json::from_value(json!({
            "_id": "j2",
            "clientName": "Bo",
            "companyName": "Initech",
            "position": "Analyst",
            "jobDescription": "Spreadsheets",
            "baseResumeId": "r9"
        }))
        .unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.optimized_resume_id.is_none());
        assert!(job.changes.is_none());
        assert!(job.job_link.is_none());
    }

    #[test]
    fn test_job_update_omits_unset_fields() {
        let update = JobUpdate {
            position: Some("Lead".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "position": "Lead" }));
    }

    #[test]
    fn test_new_resume_payload() {
        let resume = NewResume {
            client_name: "Ada".to_string(),
            content: "X".to_string(),
            version: ResumeVersion::Base,
        };
        assert_eq!(
            serde_json::to_value(&resume).unwrap(),
            json!({ "clientName": "Ada", "content": "X", "version": "base" })
        );
    }
}
