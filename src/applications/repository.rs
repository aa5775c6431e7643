//! Application storage seam.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::applications::{Application, ApplicationError};

/// Persistence for applications. Production deployments back this with a
/// hosted database; the in-memory implementation serves the binary and tests.
pub trait ApplicationRepository: Send + Sync {
    /// Store a new application. Emails are unique.
    fn insert(&self, application: Application) -> Result<Application, ApplicationError>;

    fn find_by_id(&self, id: &Uuid) -> Option<Application>;

    fn find_by_email(&self, email: &str) -> Option<Application>;
}

#[derive(Debug, Default)]
pub struct InMemoryApplications {
    by_id: DashMap<Uuid, Application>,
    by_email: DashMap<String, Uuid>,
}

impl InMemoryApplications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ApplicationRepository for InMemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, ApplicationError> {
        // The email entry lock makes check-and-insert atomic per email.
        match self.by_email.entry(application.email.clone()) {
            Entry::Occupied(existing) => Err(ApplicationError::Duplicate {
                application_id: *existing.get(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(application.application_id);
                self.by_id.insert(application.application_id, application.clone());
                Ok(application)
            }
        }
    }

    fn find_by_id(&self, id: &Uuid) -> Option<Application> {
        self.by_id.get(id).map(|r| r.value().clone())
    }

    fn find_by_email(&self, email: &str) -> Option<Application> {
        let id = *self.by_email.get(email)?;
        self.find_by_id(&id)
    }
}
