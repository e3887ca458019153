use tracing::{info, instrument};

use ebm_core::{DomainError, JobRoleId};
use ebm_people::JobRole;

use super::{now, require, ServiceResult, Stores};

#[derive(Clone)]
pub struct JobRoleService {
    stores: Stores,
}

impl JobRoleService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    #[instrument(skip(self, role), fields(name = %role.name))]
    pub async fn insert(&self, mut role: JobRole) -> ServiceResult<JobRole> {
        role.id = None;
        role.name = role.name.trim().to_string();
        role.validate()?;
        self.ensure_name_free(&role).await?;
        role.history.audit(now());
        let saved = self.stores.job_roles.insert(role).await?;
        info!(job_role_id = ?saved.id, "job role registered");
        Ok(saved)
    }

    #[instrument(skip(self, role), fields(job_role_id = ?role.id))]
    pub async fn update(&self, mut role: JobRole) -> ServiceResult<JobRole> {
        let id = role
            .id
            .ok_or_else(|| DomainError::invalid_id("job role id is required"))?;
        let stored = require(&*self.stores.job_roles, id).await?;
        role.name = role.name.trim().to_string();
        role.validate()?;
        self.ensure_name_free(&role).await?;
        role.history.carry_over(&stored.history);
        role.history.audit(now());
        Ok(self.stores.job_roles.update(role).await?)
    }

    /// Fails with `DataIntegrity` while an employee holds the role.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: JobRoleId) -> ServiceResult<()> {
        let role = require(&*self.stores.job_roles, id).await?;
        let held = self
            .stores
            .employees
            .list()
            .await?
            .iter()
            .any(|e| e.job_role_id == Some(id));
        if held {
            return Err(DomainError::integrity(format!("job role {} is held by an employee", role.name)).into());
        }
        self.stores.job_roles.delete(id).await?;
        info!(job_role_id = %id, "job role deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: JobRoleId) -> ServiceResult<JobRole> {
        require(&*self.stores.job_roles, id).await
    }

    /// All job roles ordered by name.
    pub async fn list(&self) -> ServiceResult<Vec<JobRole>> {
        let mut roles = self.stores.job_roles.list().await?;
        roles.sort_by_key(|r| r.name.to_lowercase());
        Ok(roles)
    }

    async fn ensure_name_free(&self, role: &JobRole) -> ServiceResult<()> {
        let taken = self
            .stores
            .job_roles
            .list()
            .await?
            .iter()
            .any(|r| r.id != role.id && r.name.to_lowercase() == role.name.to_lowercase());
        if taken {
            return Err(DomainError::integrity(format!("job role {} already registered", role.name)).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Registry;
    use ebm_core::PersonId;
    use ebm_people::Employee;

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let reg = Registry::in_memory();
        reg.job_roles().insert(JobRole::new("Vendedor", 250_000)).await.unwrap();
        let err = reg.job_roles().insert(JobRole::new("vendedor", 0)).await.unwrap_err();
        assert!(err.is_integrity());
    }

    #[tokio::test]
    async fn update_keeps_registration_and_allows_same_name() {
        let reg = Registry::in_memory();
        let saved = reg.job_roles().insert(JobRole::new("Gerente", 900_000)).await.unwrap();
        let mut changed = saved.clone();
        changed.base_salary = 950_000;
        let updated = reg.job_roles().update(changed).await.unwrap();
        assert_eq!(updated.base_salary, 950_000);
        assert_eq!(updated.history.registered_at, saved.history.registered_at);
    }

    #[tokio::test]
    async fn held_role_cannot_be_deleted() {
        let reg = Registry::in_memory();
        let role = reg.job_roles().insert(JobRole::new("Caixa", 150_000)).await.unwrap();
        let role_id = role.id.unwrap();
        reg.stores()
            .employees
            .insert(Employee::new(PersonId::new(1), role_id))
            .await
            .unwrap();
        assert!(reg.job_roles().delete(role_id).await.unwrap_err().is_integrity());
        assert!(reg.job_roles().delete(JobRoleId::new(42)).await.unwrap_err().is_not_found());
    }
}
