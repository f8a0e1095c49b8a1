//! In-memory fakes used by unit tests across the crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::models::application::{ApplicationRecord, ApplicationStatus, NewApplicationRecord};
use crate::models::job::{JobRecord, NewJobRecord};
use crate::store::objects::{ObjectStorage, StorageError};
use crate::store::records::{RecordStore, StoreError};

/// HashMap-backed record store. `fail_next_write` makes the next insert or
/// update fail before anything is stored, for no-partial-record tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    jobs: Mutex<HashMap<Uuid, JobRecord>>,
    applications: Mutex<HashMap<Uuid, ApplicationRecord>>,
    fail_next_write: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn check_injected_failure(&self) -> Result<(), StoreError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_job(&self, new: NewJobRecord) -> Result<JobRecord, StoreError> {
        self.check_injected_failure()?;
        let record = JobRecord {
            id: Uuid::new_v4(),
            employer_id: new.employer_id,
            title: new.title,
            description: new.description,
            employment_type: new.employment_type,
            experience_level: new.experience_level,
            skills: new.skills,
            status: new.status,
            budget_range: new.budget_range,
            duration: new.duration,
            location: new.location,
            job_post: new.job_post,
            skills_test: new.skills_test,
            interview_questions: new.interview_questions,
            created_at: Utc::now(),
        };
        self.jobs
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_job(&self, id: Uuid, new: NewJobRecord) -> Result<JobRecord, StoreError> {
        self.check_injected_failure()?;
        let mut jobs = self.jobs.lock().unwrap();
        let existing = jobs.get(&id).ok_or(StoreError::NotFound(id))?;
        let record = JobRecord {
            id,
            employer_id: new.employer_id,
            title: new.title,
            description: new.description,
            employment_type: new.employment_type,
            experience_level: new.experience_level,
            skills: new.skills,
            status: new.status,
            budget_range: new.budget_range,
            duration: new.duration,
            location: new.location,
            job_post: new.job_post,
            skills_test: new.skills_test,
            interview_questions: new.interview_questions,
            created_at: existing.created_at,
        };
        jobs.insert(id, record.clone());
        Ok(record)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn list_jobs(&self, employer_id: Uuid) -> Result<Vec<JobRecord>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.employer_id == employer_id)
            .cloned()
            .collect())
    }

    async fn insert_application(
        &self,
        new: NewApplicationRecord,
    ) -> Result<ApplicationRecord, StoreError> {
        self.check_injected_failure()?;
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            candidate_name: new.candidate_name,
            email: new.email,
            status: new.status,
            resume_url: new.resume_url,
            cover_letter: new.cover_letter,
            answers: new.answers,
            test_responses: new.test_responses,
            rating: None,
            created_at: Utc::now(),
        };
        self.applications
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self.applications.lock().unwrap().get(&id).cloned())
    }

    async fn list_applications(&self, job_id: Uuid) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        let mut applications = self.applications.lock().unwrap();
        let record = applications.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.status = status;
        Ok(())
    }

    async fn set_application_rating(
        &self,
        id: Uuid,
        rating: Option<i16>,
    ) -> Result<(), StoreError> {
        let mut applications = self.applications.lock().unwrap();
        let record = applications.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.rating = rating;
        Ok(())
    }
}

/// Object storage that records uploads instead of talking to S3.
#[derive(Default)]
pub struct MemoryObjectStorage {
    pub uploads: Mutex<Vec<(String, usize, String)>>,
    fail_next_upload: AtomicBool,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_upload(&self) {
        self.fail_next_upload.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_next_upload.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Upload("injected failure".to_string()));
        }
        self.uploads.lock().unwrap().push((
            path.to_string(),
            bytes.len(),
            content_type.to_string(),
        ));
        Ok(format!("https://storage.test/bucket/{path}"))
    }
}
