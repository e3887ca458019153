use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument, warn};

use ebm_core::{Document, DomainError, EmployeeId, JobRoleId, Page, PageRequest, PersonId};
use ebm_people::{Employee, EmployeeView, JobRole, PersonKind};

use super::person::PersonService;
use super::{contains_ci, directed, now, require, unsupported_order, ServiceResult, Stores};

/// Search criteria of the employee listing; every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub kind: Option<PersonKind>,
    pub name: Option<String>,
    /// Matches the name of companies only.
    pub trade_name: Option<String>,
    pub legal_name: Option<String>,
    pub job_role: Option<String>,
}

impl EmployeeFilter {
    fn matches(&self, view: &EmployeeView) -> bool {
        let person = &view.person;
        let is_company = person.kind() == PersonKind::Company;
        self.kind.is_none_or(|k| person.kind() == k)
            && contains_ci(&person.name, self.name.as_deref())
            && (self.trade_name.is_none() || (is_company && contains_ci(&person.name, self.trade_name.as_deref())))
            && (self.legal_name.is_none()
                || contains_ci(person.legal_name().unwrap_or(""), self.legal_name.as_deref()))
            && contains_ci(&view.job_role.name, self.job_role.as_deref())
    }
}

#[derive(Clone)]
pub struct EmployeeService {
    stores: Stores,
}

impl EmployeeService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// The person and job role must exist; a person is employed at most once.
    #[instrument(skip(self, employee), fields(person_id = ?employee.person_id))]
    pub async fn insert(&self, mut employee: Employee) -> ServiceResult<Employee> {
        employee.id = None;
        employee.validate()?;
        let (person_id, job_role_id) = required_links(&employee)?;
        self.ensure_person(person_id).await?;
        self.ensure_job_role(job_role_id).await?;

        let employed = self
            .stores
            .employees
            .list()
            .await?
            .iter()
            .any(|e| e.person_id == Some(person_id));
        if employed {
            return Err(DomainError::integrity(format!("person {person_id} is already an employee")).into());
        }

        employee.history.audit(now());
        let saved = self.stores.employees.insert(employee).await?;
        info!(employee_id = ?saved.id, "employee registered");
        Ok(saved)
    }

    /// The person of an employee cannot change.
    #[instrument(skip(self, employee), fields(employee_id = ?employee.id))]
    pub async fn update(&self, mut employee: Employee) -> ServiceResult<Employee> {
        let id = employee
            .id
            .ok_or_else(|| DomainError::invalid_id("employee id is required"))?;
        let stored = require(&*self.stores.employees, id).await?;
        match employee.person_id {
            None => employee.person_id = stored.person_id,
            Some(p) if Some(p) != stored.person_id => {
                return Err(DomainError::integrity("the person of an employee cannot change").into());
            }
            Some(_) => {}
        }
        employee.validate()?;
        let (_, job_role_id) = required_links(&employee)?;
        self.ensure_job_role(job_role_id).await?;

        employee.history.carry_over(&stored.history);
        employee.history.audit(now());
        let saved = self.stores.employees.update(employee).await?;
        info!(employee_id = %id, "employee updated");
        Ok(saved)
    }

    /// Fails with `DataIntegrity` while a user account belongs to the employee.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: EmployeeId) -> ServiceResult<()> {
        require(&*self.stores.employees, id).await?;
        let has_user = self
            .stores
            .users
            .list()
            .await?
            .iter()
            .any(|u| u.employee_id == Some(id));
        if has_user {
            return Err(DomainError::integrity(format!("employee {id} still has a user account")).into());
        }
        self.stores.employees.delete(id).await?;
        info!(employee_id = %id, "employee deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: EmployeeId) -> ServiceResult<EmployeeView> {
        let employee = require(&*self.stores.employees, id).await?;
        self.assemble(vec![employee])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found(format!("employee {id} has no person")).into())
    }

    /// Employee whose person holds this CPF or CNPJ.
    pub async fn find_by_document(&self, raw: &str) -> ServiceResult<EmployeeView> {
        let document = Document::parse(raw)?;
        let not_found = || DomainError::not_found(format!("no employee with document {}", document.as_str()));

        let person = match PersonService::new(self.stores.clone()).find_by_document(raw).await {
            Ok(person) => person,
            Err(e) if e.is_not_found() => return Err(not_found().into()),
            Err(e) => return Err(e),
        };
        let employee = self
            .stores
            .employees
            .list()
            .await?
            .into_iter()
            .find(|e| e.person_id.is_some() && e.person_id == person.id)
            .ok_or_else(not_found)?;
        let id = employee.id;
        self.assemble(vec![employee])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found(format!("employee {id:?} has no person")).into())
    }

    /// Filtered page; `order_by` is one of `name`, `id`, `job_role`, `hired_on`.
    pub async fn page(&self, filter: &EmployeeFilter, request: &PageRequest) -> ServiceResult<Page<EmployeeView>> {
        let mut views: Vec<EmployeeView> = self
            .all()
            .await?
            .into_iter()
            .filter(|v| filter.matches(v))
            .collect();

        let dir = request.direction;
        match request.order_by.as_str() {
            "name" => views.sort_by(|a, b| directed(a.person.name.to_lowercase().cmp(&b.person.name.to_lowercase()), dir)),
            "id" => views.sort_by(|a, b| directed(a.id.cmp(&b.id), dir)),
            "job_role" => views.sort_by(|a, b| directed(a.job_role.name.cmp(&b.job_role.name), dir)),
            "hired_on" => views.sort_by(|a, b| directed(a.hired_on.cmp(&b.hired_on), dir)),
            other => return Err(unsupported_order(other).into()),
        }
        Ok(Page::slice(views, request))
    }

    /// Employees whose person name contains `name` (case-insensitive).
    pub async fn ids_by_name_like(&self, name: &str) -> ServiceResult<BTreeSet<EmployeeId>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|v| contains_ci(&v.person.name, Some(name)))
            .map(|v| v.id)
            .collect())
    }

    /// Employees whose person's principal email contains `email`.
    pub async fn ids_by_principal_email_like(&self, email: &str) -> ServiceResult<BTreeSet<EmployeeId>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|v| {
                v.person
                    .principal_email()
                    .is_some_and(|e| contains_ci(&e.email, Some(email)))
            })
            .map(|v| v.id)
            .collect())
    }

    pub(crate) async fn all(&self) -> ServiceResult<Vec<EmployeeView>> {
        let employees = self.stores.employees.list().await?;
        self.assemble(employees).await
    }

    /// Joins employees with their person and job role. Rows whose person or
    /// role vanished are skipped.
    async fn assemble(&self, employees: Vec<Employee>) -> ServiceResult<Vec<EmployeeView>> {
        let person_ids: BTreeSet<PersonId> = employees.iter().filter_map(|e| e.person_id).collect();
        let mut people = PersonService::new(self.stores.clone()).by_ids(&person_ids).await?;
        let roles: HashMap<JobRoleId, JobRole> = self
            .stores
            .job_roles
            .list()
            .await?
            .into_iter()
            .filter_map(|r| r.id.map(|id| (id, r)))
            .collect();

        let mut views = Vec::with_capacity(employees.len());
        for e in employees {
            let (Some(id), Some(person_id), Some(role_id)) = (e.id, e.person_id, e.job_role_id) else {
                continue;
            };
            // Two employees never share a person, so the person can be moved out.
            let (Some(person), Some(job_role)) = (people.remove(&person_id), roles.get(&role_id)) else {
                warn!(employee_id = %id, "employee references a missing person or job role");
                continue;
            };
            views.push(EmployeeView {
                id,
                person,
                job_role: job_role.clone(),
                hired_on: e.hired_on,
                commission_rate: e.commission_rate,
                active: e.active,
                history: e.history,
            });
        }
        Ok(views)
    }

    async fn ensure_person(&self, id: PersonId) -> ServiceResult<()> {
        if self.stores.people.get(id).await?.is_none() {
            return Err(DomainError::integrity(format!("person {id} does not exist")).into());
        }
        Ok(())
    }

    async fn ensure_job_role(&self, id: JobRoleId) -> ServiceResult<()> {
        if self.stores.job_roles.get(id).await?.is_none() {
            return Err(DomainError::integrity(format!("job role {id} does not exist")).into());
        }
        Ok(())
    }
}

fn required_links(employee: &Employee) -> ServiceResult<(PersonId, JobRoleId)> {
    match (employee.person_id, employee.job_role_id) {
        (Some(p), Some(r)) => Ok((p, r)),
        _ => Err(DomainError::integrity("an employee needs a person and a job role").into()),
    }
}
