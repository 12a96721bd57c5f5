//! In-memory store and notifier for exercising views without a server.

use std::cell::{Cell, RefCell};

use crate::api::{ApiError, JobStore};
use crate::models::{
    DirectOptimizeRequest, DirectOptimizeResponse, Job, JobStatus, JobUpdate, NewJob, NewResume,
    Resume, ResumeRef,
};
use crate::notify::{Notice, Notifier};

#[derive(Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .borrow()
            .iter()
            .filter(|n| n.is_error())
            .map(|n| n.message().to_string())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

/// Which store call should fail next, and with what body `error`.
#[derive(Default)]
pub struct Failures {
    pub list_jobs: Option<Option<String>>,
    pub create_job: Option<Option<String>>,
    pub create_resume: Option<Option<String>>,
    pub update_job: Option<Option<String>>,
    pub delete_job: Option<Option<String>>,
    pub get_resume: Option<Option<String>>,
    pub optimize: Option<Option<String>>,
    pub optimize_direct: Option<Option<String>>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub jobs: RefCell<Vec<Job>>,
    pub resumes: RefCell<Vec<Resume>>,
    pub fail: RefCell<Failures>,
    pub calls: RefCell<Vec<String>>,
    next_id: Cell<u32>,
}

impl MemoryStore {
    fn next_id(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{}{}", prefix, id)
    }

    fn check(&self, call: &str, failure: Option<Option<String>>) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call.to_string());
        match failure {
            Some(message) => Err(ApiError::Backend {
                url: format!("memory://{}", call),
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    pub fn with_job(self, job: Job) -> Self {
        self.jobs.borrow_mut().push(job);
        self
    }

    pub fn with_resume(self, id: &str, content: &str, version: &str) -> Self {
        self.resumes.borrow_mut().push(Resume {
            id: id.to_string(),
            client_name: "Ada".to_string(),
            content: content.to_string(),
            version: version.to_string(),
        });
        self
    }

    pub fn resume(&self, id: &str) -> Option<Resume> {
        self.resumes.borrow().iter().find(|r| r.id == id).cloned()
    }
}

pub fn job(id: &str, status: JobStatus) -> Job {
    let optimized = status == JobStatus::Optimized;
    Job {
        id: id.to_string(),
        client_name: "Ada".to_string(),
        company_name: "Acme".to_string(),
        position: "Engineer".to_string(),
        job_description: "Build reliable systems".to_string(),
        job_link: None,
        status,
        optimized_on: None,
        base_resume_id: ResumeRef(format!("base-{}", id)),
        optimized_resume_id: optimized.then(|| ResumeRef(format!("opt-{}", id))),
        changes: optimized.then(|| "* **Skills:** Added Rust.".to_string()),
    }
}

impl JobStore for MemoryStore {
    fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.check("list_jobs", self.fail.borrow_mut().list_jobs.take())?;
        Ok(self.jobs.borrow().clone())
    }

    fn create_job(&self, new: &NewJob) -> Result<Job, ApiError> {
        self.check("create_job", self.fail.borrow_mut().create_job.take())?;
        let job = Job {
            id: self.next_id("job-"),
            client_name: new.client_name.clone(),
            company_name: new.company_name.clone(),
            position: new.position.clone(),
            job_description: new.job_description.clone(),
            job_link: new.job_link.clone(),
            status: JobStatus::Pending,
            optimized_on: None,
            base_resume_id: ResumeRef(new.base_resume_id.clone()),
            optimized_resume_id: None,
            changes: None,
        };
        self.jobs.borrow_mut().push(job.clone());
        Ok(job)
    }

    fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError> {
        self.check("update_job", self.fail.borrow_mut().update_job.take())?;
        let mut jobs = self.jobs.borrow_mut();
        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
            return Err(ApiError::Backend {
                url: "memory://update_job".to_string(),
                status: 404,
                message: Some("Job not found".to_string()),
            });
        };
        if let Some(v) = &update.client_name {
            job.client_name = v.clone();
        }
        if let Some(v) = &update.company_name {
            job.company_name = v.clone();
        }
        if let Some(v) = &update.position {
            job.position = v.clone();
        }
        if let Some(v) = &update.job_description {
            job.job_description = v.clone();
        }
        if let Some(v) = &update.job_link {
            job.job_link = (!v.is_empty()).then(|| v.clone());
        }
        Ok(job.clone())
    }

    fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        self.check("delete_job", self.fail.borrow_mut().delete_job.take())?;
        self.jobs.borrow_mut().retain(|j| j.id != id);
        Ok(())
    }

    fn get_resume(&self, id: &str) -> Result<Resume, ApiError> {
        self.check("get_resume", self.fail.borrow_mut().get_resume.take())?;
        self.resume(id).ok_or_else(|| ApiError::Backend {
            url: format!("memory://resumes/{}", id),
            status: 404,
            message: Some("Resume not found".to_string()),
        })
    }

    fn create_resume(&self, new: &NewResume) -> Result<Resume, ApiError> {
        self.check("create_resume", self.fail.borrow_mut().create_resume.take())?;
        let resume = Resume {
            id: self.next_id("resume-"),
            client_name: new.client_name.clone(),
            content: new.content.clone(),
            version: serde_json::to_value(new.version)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        };
        self.resumes.borrow_mut().push(resume.clone());
        Ok(resume)
    }

    fn optimize(&self, job_id: &str) -> Result<(), ApiError> {
        self.check("optimize", self.fail.borrow_mut().optimize.take())?;
        let mut jobs = self.jobs.borrow_mut();
        if let Some(job) = jobs.iter_mut().find(|j| j.id == job_id) {
            job.status = JobStatus::Optimized;
            job.optimized_resume_id = Some(ResumeRef(format!("opt-{}", job_id)));
            job.changes = Some("* **Summary:** Rewritten.".to_string());
        }
        Ok(())
    }

    fn optimize_direct(
        &self,
        request: &DirectOptimizeRequest,
    ) -> Result<DirectOptimizeResponse, ApiError> {
        self.check("optimize_direct", self.fail.borrow_mut().optimize_direct.take())?;
        Ok(DirectOptimizeResponse {
            optimized_resume: format!("**{}**\n{}", request.client_name, request.base_resume),
            changes: Some("* **Keywords:** Matched the posting.".to_string()),
        })
    }
}
