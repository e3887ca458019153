//! Job roles and employees.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebm_core::{impl_entity, DomainResult, EmployeeId, History, JobRoleId, PersonId, Validator};

use crate::person::Person;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRole {
    #[serde(default)]
    pub id: Option<JobRoleId>,
    pub name: String,
    /// Monthly base salary in cents.
    #[serde(default)]
    pub base_salary: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: History,
}

impl_entity!(JobRole, JobRoleId, "job_roles");

impl JobRole {
    pub fn new(name: impl Into<String>, base_salary: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            base_salary,
            description: None,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.text("name", Some(&self.name), 1, 60)
            .optional_text("description", self.description.as_deref(), 255);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Option<EmployeeId>,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub job_role_id: Option<JobRoleId>,
    #[serde(default)]
    pub hired_on: Option<NaiveDate>,
    /// Commission in percent, `0..=100`.
    #[serde(default)]
    pub commission_rate: u8,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub history: History,
}

fn active_by_default() -> bool {
    true
}

impl_entity!(Employee, EmployeeId, "employees");

impl Employee {
    pub fn new(person_id: PersonId, job_role_id: JobRoleId) -> Self {
        Self {
            id: None,
            person_id: Some(person_id),
            job_role_id: Some(job_role_id),
            hired_on: None,
            commission_rate: 0,
            active: true,
            history: History::default(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        v.check(self.person_id.is_some(), "person_id", "person_id must not be null")
            .check(self.job_role_id.is_some(), "job_role_id", "job_role_id must not be null")
            .check(
                self.commission_rate <= 100,
                "commission_rate",
                "commission_rate must be between 0 and 100",
            );
        v.finish()
    }
}

/// Employee joined with its person and job role for reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeView {
    pub id: EmployeeId,
    pub person: Person,
    pub job_role: JobRole,
    pub hired_on: Option<NaiveDate>,
    pub commission_rate: u8,
    pub active: bool,
    pub history: History,
}
