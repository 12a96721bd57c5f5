use chrono::Local;
use reqwest::Url;
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::api::{ApiError, JobStore};
use crate::changes::{ChangeCategory, NO_SUMMARY_PLACEHOLDER, parse_changes};
use crate::export::{ExportOutcome, ORIGINAL_FILENAME, OPTIMIZED_FILENAME, SaveTarget, export_pdf};
use crate::models::{
    DirectOptimizeRequest, DirectOptimizeResponse, Job, JobUpdate, NewJob, NewResume, ResumeVersion,
};
use crate::normalize::strip_emphasis;
use crate::notify::{Notice, Notifier};

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this job?";
pub const CONFIRM_OPTIMIZE: &str = "This will use AI to optimize the resume. Continue?";
pub const REOPTIMIZE_NOTICE: &str = "Job description has changed. Reoptimization recommended.";
pub const EMPTY_DASHBOARD: &str = "No job cards yet. Create your first job card!";

const PLACEHOLDER_RESUME: &str = "Base resume content will be uploaded here.";
const SNIPPET_CHARS: usize = 150;

// --- Action outcomes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadJobs,
    CreateJob,
    UpdateJob,
    DeleteJob,
    Optimize,
    DirectOptimize,
}

impl Action {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Action::LoadJobs => "Failed to load jobs",
            Action::CreateJob => "Failed to create job",
            Action::UpdateJob => "Failed to update job",
            Action::DeleteJob => "Failed to delete job",
            Action::Optimize => "Failed to optimize resume. Please check your API keys.",
            Action::DirectOptimize => "Failed to optimize resume",
        }
    }

    pub fn success_message(self) -> Option<&'static str> {
        match self {
            Action::CreateJob => Some("Job created successfully!"),
            Action::UpdateJob => Some("Job updated successfully!"),
            Action::DeleteJob => Some("Job deleted successfully!"),
            Action::Optimize => {
                Some("Resume optimized successfully! Check the job card for updates.")
            }
            _ => None,
        }
    }
}

/// A failed user action, carrying the message to show.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    pub action: Action,
    pub message: String,
}

impl ActionError {
    /// The backend's own `error` text wins over the generic per-action message.
    pub fn from_api(action: Action, err: &ApiError) -> Self {
        error!(?action, "{}", err);
        let message = err
            .backend_message()
            .unwrap_or(action.fallback_message())
            .to_string();
        Self { action, message }
    }

    fn invalid(action: Action, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }
}

fn report<T>(notifier: &dyn Notifier, result: &Result<T, ActionError>, action: Action) {
    match result {
        Ok(_) => {
            if let Some(msg) = action.success_message() {
                notifier.notify(Notice::Success(msg.to_string()));
            }
        }
        Err(e) => notifier.notify(Notice::Error(e.message.clone())),
    }
}

// --- Job form ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobForm {
    pub client_name: String,
    pub company_name: String,
    pub position: String,
    pub job_description: String,
    pub job_link: String,
    pub base_resume: String,
}

impl JobForm {
    /// Prefill from an existing job, fetching its base resume text.
    pub fn from_job(store: &dyn JobStore, job: &Job) -> Self {
        let base_resume = match store.get_resume(job.base_resume_id.id()) {
            Ok(resume) => resume.content,
            Err(e) => {
                error!(job = %job.id, "Error fetching base resume: {}", e);
                String::new()
            }
        };

        Self {
            client_name: job.client_name.clone(),
            company_name: job.company_name.clone(),
            position: job.position.clone(),
            job_description: job.job_description.clone(),
            job_link: job.job_link.clone().unwrap_or_default(),
            base_resume,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("Client Name", &self.client_name),
            ("Company Name", &self.company_name),
            ("Position", &self.position),
            ("Job Description", &self.job_description),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }

        let link = self.job_link.trim();
        if !link.is_empty() && Url::parse(link).is_err() {
            return Err(format!("Job Application Link is not a valid URL: {}", link));
        }
        Ok(())
    }

    fn job_link(&self) -> Option<String> {
        let link = self.job_link.trim();
        (!link.is_empty()).then(|| link.to_string())
    }

    fn to_update(&self) -> JobUpdate {
        JobUpdate {
            client_name: Some(self.client_name.clone()),
            company_name: Some(self.company_name.clone()),
            position: Some(self.position.clone()),
            job_description: Some(self.job_description.clone()),
            // An empty link clears the stored one.
            job_link: Some(self.job_link.trim().to_string()),
            base_resume: (!self.base_resume.is_empty()).then(|| self.base_resume.clone()),
        }
    }
}

// --- Dashboard ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFlags {
    pub needs_reoptimization: bool,
    pub optimize_error: Option<String>,
}

/// The job list as last fetched, plus per-card UI flags.
pub struct Dashboard<'a> {
    store: &'a dyn JobStore,
    notifier: &'a dyn Notifier,
    jobs: Vec<Job>,
    flags: HashMap<String, CardFlags>,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a dyn JobStore, notifier: &'a dyn Notifier) -> Self {
        Self {
            store,
            notifier,
            jobs: Vec::new(),
            flags: HashMap::new(),
        }
    }

    pub fn store(&self) -> &'a dyn JobStore {
        self.store
    }

    pub fn notifier(&self) -> &'a dyn Notifier {
        self.notifier
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn flags(&self, id: &str) -> CardFlags {
        self.flags.get(id).cloned().unwrap_or_default()
    }

    pub fn refresh(&mut self) -> Result<(), ActionError> {
        let result = self.fetch_jobs();
        if let Err(e) = &result {
            self.notifier.notify(Notice::Error(e.message.clone()));
        }
        result
    }

    fn fetch_jobs(&mut self) -> Result<(), ActionError> {
        let jobs = self
            .store
            .list_jobs()
            .map_err(|e| ActionError::from_api(Action::LoadJobs, &e))?;
        self.flags.retain(|id, _| jobs.iter().any(|j| &j.id == id));
        self.jobs = jobs;
        Ok(())
    }

    /// Store the base resume, then the job pointing at it.
    pub fn create_job(&mut self, form: &JobForm) -> Result<Job, ActionError> {
        let result = self.try_create_job(form);
        report(self.notifier, &result, Action::CreateJob);
        result
    }

    fn try_create_job(&mut self, form: &JobForm) -> Result<Job, ActionError> {
        form.validate()
            .map_err(|msg| ActionError::invalid(Action::CreateJob, msg))?;

        let content = if form.base_resume.trim().is_empty() {
            PLACEHOLDER_RESUME.to_string()
        } else {
            form.base_resume.clone()
        };
        let resume = self
            .store
            .create_resume(&NewResume {
                client_name: form.client_name.clone(),
                content,
                version: ResumeVersion::Base,
            })
            .map_err(|e| ActionError::from_api(Action::CreateJob, &e))?;

        let job = self
            .store
            .create_job(&NewJob {
                client_name: form.client_name.clone(),
                company_name: form.company_name.clone(),
                position: form.position.clone(),
                job_description: form.job_description.clone(),
                job_link: form.job_link(),
                base_resume_id: resume.id,
            })
            .map_err(|e| ActionError::from_api(Action::CreateJob, &e))?;

        info!(job = %job.id, "created job");
        self.jobs.push(job.clone());
        Ok(job)
    }

    pub fn update_job(&mut self, id: &str, form: &JobForm) -> Result<Job, ActionError> {
        let result = self.try_update_job(id, form);
        report(self.notifier, &result, Action::UpdateJob);
        result
    }

    fn try_update_job(&mut self, id: &str, form: &JobForm) -> Result<Job, ActionError> {
        form.validate()
            .map_err(|msg| ActionError::invalid(Action::UpdateJob, msg))?;

        let previous = self.job(id).map(|j| j.job_description.clone());
        let updated = self
            .store
            .update_job(id, &form.to_update())
            .map_err(|e| ActionError::from_api(Action::UpdateJob, &e))?;

        let description_changed = previous.is_some_and(|d| d != updated.job_description);
        if description_changed && updated.is_optimized() {
            self.flags.entry(id.to_string()).or_default().needs_reoptimization = true;
        }

        match self.jobs.iter_mut().find(|j| j.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => self.jobs.push(updated.clone()),
        }
        Ok(updated)
    }

    /// Callers confirm with [`CONFIRM_DELETE`] first.
    pub fn delete_job(&mut self, id: &str) -> Result<(), ActionError> {
        let result = self
            .store
            .delete_job(id)
            .map_err(|e| ActionError::from_api(Action::DeleteJob, &e));
        if result.is_ok() {
            self.jobs.retain(|j| j.id != id);
            self.flags.remove(id);
        }
        report(self.notifier, &result, Action::DeleteJob);
        result
    }

    /// Trigger optimization and refetch the list. Callers confirm with [`CONFIRM_OPTIMIZE`] first.
    pub fn optimize(&mut self, id: &str) -> Result<(), ActionError> {
        let flags = self.flags.entry(id.to_string()).or_default();
        let was_stale = flags.needs_reoptimization;
        flags.optimize_error = None;
        flags.needs_reoptimization = false;

        let result = self
            .store
            .optimize(id)
            .map_err(|e| ActionError::from_api(Action::Optimize, &e));

        if let Err(e) = &result {
            let flags = self.flags.entry(id.to_string()).or_default();
            flags.optimize_error = Some(e.message.clone());
            flags.needs_reoptimization = was_stale;
        }
        report(self.notifier, &result, Action::Optimize);

        // The optimization went through even if the list could not be reloaded.
        if result.is_ok() {
            if let Err(e) = self.fetch_jobs() {
                warn!(job = %id, "job list is stale after optimization");
                self.notifier.notify(Notice::Error(e.message));
            }
        }
        result
    }
}

// --- Card helpers ---

pub fn description_snippet(text: &str) -> String {
    let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", snippet)
}

pub fn optimized_on_local(job: &Job) -> Option<String> {
    job.optimized_on.map(|at| {
        at.with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string()
    })
}

pub fn optimize_label(job: &Job, flags: &CardFlags) -> &'static str {
    if flags.needs_reoptimization && job.is_optimized() {
        "Reoptimize Resume"
    } else {
        "Optimize Resume"
    }
}

// --- Changes view ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Original,
    Optimized,
}

impl Panel {
    pub fn filename(self) -> &'static str {
        match self {
            Panel::Original => ORIGINAL_FILENAME,
            Panel::Optimized => OPTIMIZED_FILENAME,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::Original => "Original Resume",
            Panel::Optimized => "Optimized Resume",
        }
    }
}

/// Both resume versions of a job and its parsed change summary.
#[derive(Debug, Clone)]
pub struct ChangesView {
    pub categories: Vec<ChangeCategory>,
    base_resume: Option<String>,
    optimized_resume: Option<String>,
}

impl ChangesView {
    pub fn load(store: &dyn JobStore, job: &Job) -> Self {
        let fetch = |id: &str| match store.get_resume(id) {
            Ok(resume) => Some(resume.content),
            Err(e) => {
                error!(resume = id, "Error fetching resume: {}", e);
                None
            }
        };

        let base_resume = fetch(job.base_resume_id.id());
        let optimized_resume = job.optimized_resume_id.as_ref().and_then(|r| fetch(r.id()));

        Self {
            categories: parse_changes(job.changes.as_deref().unwrap_or_default()),
            base_resume,
            optimized_resume,
        }
    }

    /// Shown instead of categories when the job has no summary.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.categories.is_empty().then_some(NO_SUMMARY_PLACEHOLDER)
    }

    /// Normalized text of one panel. Only available once both versions loaded.
    pub fn panel(&self, panel: Panel) -> Option<String> {
        let base = self.base_resume.as_deref().filter(|s| !s.is_empty())?;
        let optimized = self.optimized_resume.as_deref().filter(|s| !s.is_empty())?;
        Some(strip_emphasis(match panel {
            Panel::Original => base,
            Panel::Optimized => optimized,
        }))
    }

    pub fn has_comparison(&self) -> bool {
        self.panel(Panel::Original).is_some()
    }

    pub fn export(
        &self,
        panel: Panel,
        target: Option<&dyn SaveTarget>,
        notifier: &dyn Notifier,
    ) -> ExportOutcome {
        match self.panel(panel) {
            Some(text) => export_pdf(&text, panel.filename(), target, notifier),
            None => ExportOutcome::Skipped,
        }
    }
}

// --- Direct optimize ---

#[derive(Debug, Clone, Default)]
pub struct DirectForm {
    pub client_name: String,
    pub job_description: String,
    pub base_resume: String,
}

/// One-shot optimization without storing anything.
pub fn direct_optimize(
    store: &dyn JobStore,
    notifier: &dyn Notifier,
    form: &DirectForm,
) -> Result<DirectOptimizeResponse, ActionError> {
    let result = if [&form.client_name, &form.job_description, &form.base_resume]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        Err(ActionError::invalid(Action::DirectOptimize, "Please fill in all fields"))
    } else {
        store
            .optimize_direct(&DirectOptimizeRequest {
                base_resume: form.base_resume.clone(),
                job_description: form.job_description.clone(),
                client_name: form.client_name.clone(),
            })
            .map_err(|e| ActionError::from_api(Action::DirectOptimize, &e))
    };
    report(notifier, &result, Action::DirectOptimize);
    result
}
