//! User accounts: one per employee, passwords stored as Argon2 hashes.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument, warn};

use ebm_auth::{hash_password, verify_password, User, UserDraft, UserListItem};
use ebm_core::{Document, DomainError, EmployeeId, Page, PageRequest, UserId};
use ebm_people::EmployeeView;

use super::employee::EmployeeService;
use super::{contains_ci, directed, now, require, unsupported_order, ServiceResult, Stores};

/// Filters of the user listing. Each present filter is a case-insensitive
/// "contains"; results must satisfy all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Name of the employee's person.
    pub name: Option<String>,
    pub login: Option<String>,
    /// Principal email of the employee's person.
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    stores: Stores,
}

impl UserService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    #[instrument(skip(self, draft), fields(login = ?draft.login))]
    pub async fn insert(&self, mut draft: UserDraft) -> ServiceResult<User> {
        trim_login(&mut draft);
        draft.validate(true)?;
        let employee_id = draft
            .employee_id
            .ok_or_else(|| DomainError::integrity("a user needs an associated employee"))?;
        if self.stores.employees.get(employee_id).await?.is_none() {
            return Err(DomainError::integrity(format!("employee {employee_id} does not exist")).into());
        }

        let users = self.stores.users.list().await?;
        if users.iter().any(|u| u.employee_id == Some(employee_id)) {
            return Err(DomainError::integrity(format!("employee {employee_id} already has a user")).into());
        }
        let login = draft.login.take().unwrap_or_default();
        ensure_login_free(&users, &login, None)?;

        let password = draft.password.as_deref().unwrap_or_default();
        let mut user = User {
            id: None,
            login,
            password_hash: hash_password(password)?,
            permissions: draft.permissions,
            employee_id: Some(employee_id),
            history: Default::default(),
        };
        user.history.audit(now());
        let saved = self.stores.users.insert(user).await?;
        info!(user_id = ?saved.id, "user registered");
        Ok(saved)
    }

    /// The employee cannot change; the password is re-hashed only when a new
    /// one is supplied.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: UserId, mut draft: UserDraft) -> ServiceResult<User> {
        let stored = require(&*self.stores.users, id).await?;
        trim_login(&mut draft);
        draft.validate(false)?;
        if draft.employee_id.is_some() && draft.employee_id != stored.employee_id {
            return Err(DomainError::integrity("the employee of a user cannot change").into());
        }

        let users = self.stores.users.list().await?;
        let login = draft.login.take().unwrap_or_default();
        ensure_login_free(&users, &login, Some(id))?;

        let password_hash = match draft.password.as_deref() {
            Some(p) => hash_password(p)?,
            None => stored.password_hash.clone(),
        };
        let mut user = User {
            id: Some(id),
            login,
            password_hash,
            permissions: draft.permissions,
            employee_id: stored.employee_id,
            history: stored.history,
        };
        user.history.audit(now());
        let saved = self.stores.users.update(user).await?;
        info!(user_id = %id, "user updated");
        Ok(saved)
    }

    pub async fn insert_all(&self, drafts: Vec<UserDraft>) -> ServiceResult<Vec<User>> {
        let mut saved = Vec::with_capacity(drafts.len());
        for draft in drafts {
            saved.push(self.insert(draft).await?);
        }
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: UserId) -> ServiceResult<()> {
        require(&*self.stores.users, id).await?;
        self.stores.users.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: UserId) -> ServiceResult<User> {
        require(&*self.stores.users, id).await
    }

    pub async fn find_by_login(&self, login: &str) -> ServiceResult<User> {
        let login = login.trim();
        self.stores
            .users
            .list()
            .await?
            .into_iter()
            .find(|u| u.login == login)
            .ok_or_else(|| DomainError::not_found(format!("user {login} not found")).into())
    }

    /// User of the employee whose person holds this CPF or CNPJ.
    pub async fn find_by_document(&self, raw: &str) -> ServiceResult<User> {
        let document = Document::parse(raw)?;
        let not_found = || DomainError::not_found(format!("no user with document {}", document.as_str()));

        let employee = match EmployeeService::new(self.stores.clone()).find_by_document(raw).await {
            Ok(view) => view,
            Err(e) if e.is_not_found() => return Err(not_found().into()),
            Err(e) => return Err(e),
        };
        self.stores
            .users
            .list()
            .await?
            .into_iter()
            .find(|u| u.employee_id == Some(employee.id))
            .ok_or_else(|| not_found().into())
    }

    /// Checks a login/password pair. Any mismatch is `Unauthorized`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> ServiceResult<User> {
        let user = match self.find_by_login(login).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                warn!("login rejected: unknown user");
                return Err(DomainError::Unauthorized.into());
            }
            Err(e) => return Err(e),
        };
        if !verify_password(password, &user.password_hash) {
            warn!("login rejected: wrong password");
            return Err(DomainError::Unauthorized.into());
        }
        Ok(user)
    }

    /// Filtered listing; `order_by` is one of `name`, `login`, `id`.
    pub async fn page(&self, filter: &UserFilter, request: &PageRequest) -> ServiceResult<Page<UserListItem>> {
        let employees = EmployeeService::new(self.stores.clone());
        let views: HashMap<EmployeeId, EmployeeView> =
            employees.all().await?.into_iter().map(|v| (v.id, v)).collect();

        // Each filter narrows a set of employee ids; users must hit all sets.
        let mut allowed: Option<BTreeSet<EmployeeId>> = None;
        if let Some(name) = filter.name.as_deref().filter(|n| !n.trim().is_empty()) {
            allowed = Some(intersect(allowed, employees.ids_by_name_like(name).await?));
        }
        if let Some(email) = filter.email.as_deref().filter(|e| !e.trim().is_empty()) {
            allowed = Some(intersect(allowed, employees.ids_by_principal_email_like(email).await?));
        }

        let mut items: Vec<UserListItem> = self
            .stores
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| contains_ci(&u.login, filter.login.as_deref()))
            .filter_map(|u| {
                let employee_id = u.employee_id?;
                if allowed.as_ref().is_some_and(|ids| !ids.contains(&employee_id)) {
                    return None;
                }
                let person = &views.get(&employee_id)?.person;
                Some(UserListItem {
                    id: u.id?,
                    name: person.name.clone(),
                    login: u.login,
                    email: person.principal_email().map(|e| e.email.clone()),
                })
            })
            .collect();

        let dir = request.direction;
        match request.order_by.as_str() {
            "name" => items.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), dir)),
            "login" => items.sort_by(|a, b| directed(a.login.cmp(&b.login), dir)),
            "id" => items.sort_by(|a, b| directed(a.id.cmp(&b.id), dir)),
            other => return Err(unsupported_order(other).into()),
        }
        Ok(Page::slice(items, request))
    }
}

/// Length rules apply to the login as stored.
fn trim_login(draft: &mut UserDraft) {
    if let Some(login) = draft.login.as_mut() {
        *login = login.trim().to_string();
    }
}

fn ensure_login_free(users: &[User], login: &str, own_id: Option<UserId>) -> ServiceResult<()> {
    if users.iter().any(|u| u.login == login && u.id != own_id) {
        return Err(DomainError::integrity(format!("login {login} already in use")).into());
    }
    Ok(())
}

fn intersect(acc: Option<BTreeSet<EmployeeId>>, ids: BTreeSet<EmployeeId>) -> BTreeSet<EmployeeId> {
    match acc {
        None => ids,
        Some(acc) => acc.intersection(&ids).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::individual;
    use crate::services::Registry;
    use ebm_auth::Permission;
    use ebm_people::{Employee, JobRole};

    async fn employee(reg: &Registry, name: &str, cpf: &str, email: &str) -> EmployeeId {
        let role = match reg.job_roles().list().await.unwrap().into_iter().next() {
            Some(role) => role,
            None => reg.job_roles().insert(JobRole::new("Vendedor", 200_000)).await.unwrap(),
        };
        let person = reg.people().insert(individual(name, cpf, email)).await.unwrap();
        reg.employees()
            .insert(Employee::new(person.id.unwrap(), role.id.unwrap()))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    fn draft(login: &str, employee: EmployeeId) -> UserDraft {
        UserDraft::new(login, "s3nha", [Permission::new("USER_GET")], employee)
    }

    #[tokio::test]
    async fn insert_hashes_password_and_authenticates() {
        let reg = Registry::in_memory();
        let e = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;
        let user = reg.users().insert(draft("ana", e)).await.unwrap();
        assert_ne!(user.password_hash, "s3nha");
        assert!(user.history.registered_at.is_some());

        assert_eq!(reg.users().authenticate("ana", "s3nha").await.unwrap().id, user.id);
        let err = reg.users().authenticate("ana", "wrong").await.unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::Unauthorized));
        let err = reg.users().authenticate("nobody", "s3nha").await.unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn employee_is_required_and_unique() {
        let reg = Registry::in_memory();
        let e = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;

        let no_employee = UserDraft {
            employee_id: None,
            ..draft("ana", e)
        };
        assert!(reg.users().insert(no_employee).await.unwrap_err().is_integrity());

        reg.users().insert(draft("ana", e)).await.unwrap();
        assert!(reg.users().insert(draft("ana2", e)).await.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn login_is_unique() {
        let reg = Registry::in_memory();
        let a = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;
        let b = employee(&reg, "Bruno Reis", "11144477735", "bruno@example.com").await;
        reg.users().insert(draft("ana", a)).await.unwrap();
        assert!(reg.users().insert(draft("ana", b)).await.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn update_rules() {
        let reg = Registry::in_memory();
        let a = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;
        let b = employee(&reg, "Bruno Reis", "11144477735", "bruno@example.com").await;
        let user = reg.users().insert(draft("ana", a)).await.unwrap();
        let id = user.id.unwrap();

        assert!(reg.users().update(id, draft("ana", b)).await.unwrap_err().is_integrity());

        let keep_password = UserDraft {
            password: None,
            employee_id: None,
            login: Some("ana.lima".into()),
            ..draft("ana", a)
        };
        let updated = reg.users().update(id, keep_password).await.unwrap();
        assert_eq!(updated.login, "ana.lima");
        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(updated.employee_id, Some(a));
        assert!(updated.history.modified_at.is_some());

        assert!(reg.users().update(UserId::new(99), draft("x", a)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn login_length_counts_after_trimming() {
        let reg = Registry::in_memory();
        let a = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;

        let err = reg.users().insert(draft("  ab  ", a)).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        assert!(reg.users().find_by_login("ab").await.unwrap_err().is_not_found());

        let user = reg.users().insert(draft("  ana  ", a)).await.unwrap();
        assert_eq!(user.login, "ana");
        let id = user.id.unwrap();

        let padded = UserDraft {
            password: None,
            ..draft("  ab  ", a)
        };
        let err = reg.users().update(id, padded).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        assert_eq!(reg.users().find_by_id(id).await.unwrap().login, "ana");

        let renamed = UserDraft {
            password: None,
            ..draft(" ana.lima ", a)
        };
        assert_eq!(reg.users().update(id, renamed).await.unwrap().login, "ana.lima");
    }

    #[tokio::test]
    async fn find_by_document_goes_through_employee() {
        let reg = Registry::in_memory();
        let a = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;
        employee(&reg, "Bruno Reis", "11144477735", "bruno@example.com").await;
        let user = reg.users().insert(draft("ana", a)).await.unwrap();

        assert_eq!(reg.users().find_by_document("987.654.321-00").await.unwrap().id, user.id);
        assert!(reg.users().find_by_document("11144477735").await.unwrap_err().is_not_found());
        assert!(reg.users().find_by_document("11144477700").await.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn page_intersects_filters() {
        let reg = Registry::in_memory();
        let a = employee(&reg, "Ana Lima", "98765432100", "ana@example.com").await;
        let b = employee(&reg, "Bruno Lima", "11144477735", "bruno@work.com").await;
        let c = employee(&reg, "Carla Dias", "56661050004", "carla@work.com").await;
        reg.users()
            .insert_all(vec![draft("ana", a), draft("bruno", b), draft("carla", c)])
            .await
            .unwrap();

        let logins = |filter: UserFilter| {
            let reg = reg.clone();
            async move {
                reg.users()
                    .page(&filter, &PageRequest::default())
                    .await
                    .unwrap()
                    .content
                    .into_iter()
                    .map(|u| u.login)
                    .collect::<Vec<_>>()
            }
        };

        assert_eq!(logins(UserFilter::default()).await, vec!["ana", "bruno", "carla"]);
        assert_eq!(
            logins(UserFilter { name: Some("lima".into()), ..Default::default() }).await,
            vec!["ana", "bruno"]
        );
        assert_eq!(
            logins(UserFilter {
                name: Some("lima".into()),
                email: Some("work.com".into()),
                ..Default::default()
            })
            .await,
            vec!["bruno"]
        );
        assert_eq!(
            logins(UserFilter { login: Some("CAR".into()), ..Default::default() }).await,
            vec!["carla"]
        );

        let page = reg.users().page(&UserFilter::default(), &PageRequest::default()).await.unwrap();
        assert_eq!(page.content[0].email.as_deref(), Some("ana@example.com"));
    }
}
