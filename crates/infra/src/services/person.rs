//! Person registration with its contact lists.
//!
//! Contacts live in their own stores, keyed back to the person. A person is
//! stored with empty lists and reassembled on every read.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument};

use ebm_core::{
    Cnpj, Cpf, Document, DomainError, Entity, History, Page, PageRequest, PersonId,
};
use ebm_people::{Address, Contacts, Email, Person, PersonKind, Phone};

use super::contact::{AddressService, EmailService, PhoneService};
use super::{contains_ci, directed, now, require, unsupported_order, ServiceResult, Stores};
use crate::store::StoreError;

/// Search criteria of the person listing; every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub kind: Option<PersonKind>,
    pub name: Option<String>,
    pub legal_name: Option<String>,
    pub email: Option<String>,
}

impl PersonFilter {
    pub fn matches(&self, p: &Person) -> bool {
        self.kind.is_none_or(|k| p.kind() == k)
            && contains_ci(&p.name, self.name.as_deref())
            && (self.legal_name.is_none() || contains_ci(p.legal_name().unwrap_or(""), self.legal_name.as_deref()))
            && (self.email.is_none()
                || p.emails.iter().any(|e| contains_ci(&e.email, self.email.as_deref())))
    }
}

#[derive(Clone)]
pub struct PersonService {
    stores: Stores,
}

impl PersonService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Validates, checks the document checksum and uniqueness, then stores
    /// the person followed by its contacts.
    #[instrument(skip(self, person), fields(kind = %person.kind()))]
    pub async fn insert(&self, mut person: Person) -> ServiceResult<Person> {
        person.id = None;
        person.name = person.name.trim().to_string();
        person.validate()?;
        person.normalize_document()?;
        person.normalize_principals()?;
        self.ensure_document_free(&person, None).await?;

        person.history = History::default();
        person.history.audit(now());

        let mut contacts = person.detach_contacts();
        contacts.emails.iter_mut().for_each(|e| e.id = None);
        contacts.phones.iter_mut().for_each(|p| p.id = None);
        contacts.addresses.iter_mut().for_each(|a| a.id = None);

        let mut saved = self.stores.people.insert(person).await?;
        let id = saved.id.ok_or(StoreError::MissingId(Person::COLLECTION))?;
        saved.attach_contacts(self.save_contacts(id, contacts).await?);
        info!(person_id = %id, "person registered");
        Ok(saved)
    }

    /// Replaces a stored person. Submitted contact lists replace the stored
    /// ones; contacts left out are deleted.
    #[instrument(skip(self, person), fields(person_id = ?person.id))]
    pub async fn update(&self, mut person: Person) -> ServiceResult<Person> {
        let id = person
            .id
            .ok_or_else(|| DomainError::invalid_id("person id is required"))?;
        let stored = require(&*self.stores.people, id).await?;
        if stored.kind() != person.kind() {
            return Err(DomainError::integrity("the kind of a person cannot change").into());
        }

        person.name = person.name.trim().to_string();
        person.validate()?;
        person.normalize_document()?;
        person.normalize_principals()?;
        self.ensure_document_free(&person, Some(id)).await?;

        person.history.carry_over(&stored.history);
        person.history.audit(now());

        let existing = self.load_contacts(id).await?;
        let contacts = person.detach_contacts();
        ensure_owned("email", contacts.emails.iter().map(|e| e.id), existing.emails.iter().map(|e| e.id))?;
        ensure_owned("phone", contacts.phones.iter().map(|p| p.id), existing.phones.iter().map(|p| p.id))?;
        ensure_owned(
            "address",
            contacts.addresses.iter().map(|a| a.id),
            existing.addresses.iter().map(|a| a.id),
        )?;

        let saved_contacts = self.save_contacts(id, contacts).await?;
        self.delete_left_out(&existing, &saved_contacts).await?;

        let mut saved = self.stores.people.update(person).await?;
        saved.attach_contacts(saved_contacts);
        info!(person_id = %id, "person updated");
        Ok(saved)
    }

    /// Deletes a person and its contacts. Fails with `DataIntegrity` while an
    /// employee, supplier or customer refers to the person.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: PersonId) -> ServiceResult<()> {
        require(&*self.stores.people, id).await?;

        let role = if self.stores.employees.list().await?.iter().any(|e| e.person_id == Some(id)) {
            Some("an employee")
        } else if self.stores.suppliers.list().await?.iter().any(|s| s.person_id == Some(id)) {
            Some("a supplier")
        } else if self.stores.customers.list().await?.iter().any(|c| c.person_id == Some(id)) {
            Some("a customer")
        } else {
            None
        };
        if let Some(role) = role {
            return Err(DomainError::integrity(format!("person {id} is referenced by {role}")).into());
        }

        EmailService::new(self.stores.clone()).delete_by_person(id).await?;
        PhoneService::new(self.stores.clone()).delete_by_person(id).await?;
        AddressService::new(self.stores.clone()).delete_by_person(id).await?;
        self.stores.people.delete(id).await?;
        info!(person_id = %id, "person deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: PersonId) -> ServiceResult<Person> {
        let mut person = require(&*self.stores.people, id).await?;
        person.attach_contacts(self.load_contacts(id).await?);
        Ok(person)
    }

    pub async fn find_by_cpf(&self, cpf: &str) -> ServiceResult<Person> {
        let cpf = Cpf::parse(cpf)?;
        self.find_document(cpf.as_str()).await
    }

    pub async fn find_by_cnpj(&self, cnpj: &str) -> ServiceResult<Person> {
        let cnpj = Cnpj::parse(cnpj)?;
        self.find_document(cnpj.as_str()).await
    }

    /// CPF or CNPJ, decided by digit count.
    pub async fn find_by_document(&self, raw: &str) -> ServiceResult<Person> {
        let document = Document::parse(raw)?;
        self.find_document(document.as_str()).await
    }

    pub async fn find_by_name(&self, name: &str) -> ServiceResult<Vec<Person>> {
        self.find_matching(&PersonFilter {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
    }

    /// People holding exactly this email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Vec<Person>> {
        let email = email.trim();
        let owners: BTreeSet<PersonId> = self
            .stores
            .emails
            .list()
            .await?
            .into_iter()
            .filter(|e| e.email.eq_ignore_ascii_case(email))
            .filter_map(|e| e.person_id)
            .collect();
        let people = self.all().await?;
        Ok(people
            .into_iter()
            .filter(|p| p.id.is_some_and(|id| owners.contains(&id)))
            .collect())
    }

    pub async fn find_by_legal_name(&self, legal_name: &str) -> ServiceResult<Vec<Person>> {
        self.find_matching(&PersonFilter {
            legal_name: Some(legal_name.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn find_by_kind(&self, kind: PersonKind) -> ServiceResult<Vec<Person>> {
        self.find_matching(&PersonFilter {
            kind: Some(kind),
            ..Default::default()
        })
        .await
    }

    pub async fn ids_matching(&self, filter: &PersonFilter) -> ServiceResult<BTreeSet<PersonId>> {
        Ok(self
            .find_matching(filter)
            .await?
            .into_iter()
            .filter_map(|p| p.id)
            .collect())
    }

    /// Filtered page; `order_by` is one of `name`, `id`, `kind`.
    pub async fn page(&self, filter: &PersonFilter, request: &PageRequest) -> ServiceResult<Page<Person>> {
        let mut people = self.find_matching(filter).await?;
        sort_people(&mut people, request)?;
        Ok(Page::slice(people, request))
    }

    /// Every person with contacts attached, in key order.
    pub(crate) async fn all(&self) -> ServiceResult<Vec<Person>> {
        let people = self.stores.people.list().await?;
        self.attach_all(people).await
    }

    /// Looks up several people at once, keyed by id.
    pub(crate) async fn by_ids(&self, ids: &BTreeSet<PersonId>) -> ServiceResult<HashMap<PersonId, Person>> {
        let people: Vec<Person> = self
            .stores
            .people
            .list()
            .await?
            .into_iter()
            .filter(|p| p.id.is_some_and(|id| ids.contains(&id)))
            .collect();
        Ok(self
            .attach_all(people)
            .await?
            .into_iter()
            .filter_map(|p| p.id.map(|id| (id, p)))
            .collect())
    }

    async fn find_matching(&self, filter: &PersonFilter) -> ServiceResult<Vec<Person>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect())
    }

    async fn find_document(&self, digits: &str) -> ServiceResult<Person> {
        let found = self
            .stores
            .people
            .list()
            .await?
            .into_iter()
            .find(|p| p.document() == digits);
        match found {
            Some(mut person) => {
                if let Some(id) = person.id {
                    person.attach_contacts(self.load_contacts(id).await?);
                }
                Ok(person)
            }
            None => Err(DomainError::not_found(format!("no person with document {digits}")).into()),
        }
    }

    async fn ensure_document_free(&self, person: &Person, own_id: Option<PersonId>) -> ServiceResult<()> {
        let taken = self
            .stores
            .people
            .list()
            .await?
            .iter()
            .any(|p| p.document() == person.document() && p.id != own_id);
        if taken {
            let what = match person.kind() {
                PersonKind::Individual => "cpf",
                PersonKind::Company => "cnpj",
            };
            return Err(DomainError::integrity(format!("{what} {} already registered", person.document())).into());
        }
        Ok(())
    }

    async fn load_contacts(&self, id: PersonId) -> ServiceResult<Contacts> {
        let owned = |owner: Option<PersonId>| owner == Some(id);
        Ok(Contacts {
            emails: self.stores.emails.list().await?.into_iter().filter(|e| owned(e.person_id)).collect(),
            phones: self.stores.phones.list().await?.into_iter().filter(|p| owned(p.person_id)).collect(),
            addresses: self
                .stores
                .addresses
                .list()
                .await?
                .into_iter()
                .filter(|a| owned(a.person_id))
                .collect(),
        })
    }

    async fn attach_all(&self, people: Vec<Person>) -> ServiceResult<Vec<Person>> {
        let mut emails = group(self.stores.emails.list().await?, |e: &Email| e.person_id);
        let mut phones = group(self.stores.phones.list().await?, |p: &Phone| p.person_id);
        let mut addresses = group(self.stores.addresses.list().await?, |a: &Address| a.person_id);

        Ok(people
            .into_iter()
            .map(|mut p| {
                if let Some(id) = p.id {
                    p.attach_contacts(Contacts {
                        emails: emails.remove(&id).unwrap_or_default(),
                        phones: phones.remove(&id).unwrap_or_default(),
                        addresses: addresses.remove(&id).unwrap_or_default(),
                    });
                }
                p
            })
            .collect())
    }

    async fn save_contacts(&self, id: PersonId, mut contacts: Contacts) -> ServiceResult<Contacts> {
        contacts.emails.iter_mut().for_each(|e| e.person_id = Some(id));
        contacts.phones.iter_mut().for_each(|p| p.person_id = Some(id));
        contacts.addresses.iter_mut().for_each(|a| a.person_id = Some(id));

        Ok(Contacts {
            emails: EmailService::new(self.stores.clone()).save_all(contacts.emails).await?,
            phones: PhoneService::new(self.stores.clone()).save_all(contacts.phones).await?,
            addresses: AddressService::new(self.stores.clone())
                .save_all(contacts.addresses)
                .await?,
        })
    }

    async fn delete_left_out(&self, existing: &Contacts, kept: &Contacts) -> ServiceResult<()> {
        let kept_emails: BTreeSet<_> = kept.emails.iter().filter_map(|e| e.id).collect();
        for id in existing.emails.iter().filter_map(|e| e.id) {
            if !kept_emails.contains(&id) {
                self.stores.emails.delete(id).await?;
            }
        }
        let kept_phones: BTreeSet<_> = kept.phones.iter().filter_map(|p| p.id).collect();
        for id in existing.phones.iter().filter_map(|p| p.id) {
            if !kept_phones.contains(&id) {
                self.stores.phones.delete(id).await?;
            }
        }
        let kept_addresses: BTreeSet<_> = kept.addresses.iter().filter_map(|a| a.id).collect();
        for id in existing.addresses.iter().filter_map(|a| a.id) {
            if !kept_addresses.contains(&id) {
                self.stores.addresses.delete(id).await?;
            }
        }
        Ok(())
    }
}

/// Submitted contact ids must already belong to the person being updated.
fn ensure_owned<Id: Ord + core::fmt::Display>(
    what: &str,
    submitted: impl Iterator<Item = Option<Id>>,
    existing: impl Iterator<Item = Option<Id>>,
) -> ServiceResult<()> {
    let existing: BTreeSet<Id> = existing.flatten().collect();
    for id in submitted.flatten() {
        if !existing.contains(&id) {
            return Err(DomainError::integrity(format!("{what} {id} does not belong to this person")).into());
        }
    }
    Ok(())
}

fn group<T>(items: Vec<T>, owner: impl Fn(&T) -> Option<PersonId>) -> HashMap<PersonId, Vec<T>> {
    let mut map: HashMap<PersonId, Vec<T>> = HashMap::new();
    for item in items {
        if let Some(id) = owner(&item) {
            map.entry(id).or_default().push(item);
        }
    }
    map
}

fn sort_people(people: &mut [Person], request: &PageRequest) -> ServiceResult<()> {
    let key = request.order_by.as_str();
    match key {
        "name" => people.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), request.direction)),
        "id" => people.sort_by(|a, b| directed(a.id.cmp(&b.id), request.direction)),
        "kind" => people.sort_by(|a, b| directed(a.kind().as_str().cmp(b.kind().as_str()), request.direction)),
        other => return Err(unsupported_order(other).into()),
    }
    Ok(())
}
