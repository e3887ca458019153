use std::collections::BTreeSet;

use tracing::{info, instrument};

use ebm_core::{AddressId, DomainError, EmailId, PersonId, PhoneId};
use ebm_people::{Address, Email, Phone};

use super::location::CityService;
use super::{now, require, ServiceResult, Stores};

#[derive(Clone)]
pub struct AddressService {
    stores: Stores,
}

impl AddressService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Saves the city first. Inserts when the address has no id, otherwise
    /// replaces the stored record.
    #[instrument(skip(self, address), fields(address_id = ?address.id))]
    pub async fn save(&self, mut address: Address) -> ServiceResult<Address> {
        address.validate()?;
        let city = address
            .city
            .take()
            .ok_or_else(|| DomainError::integrity("an address requires a city"))?;
        address.city = Some(CityService::new(self.stores.clone()).save(city).await?);

        match address.id {
            Some(id) => {
                let stored = require(&*self.stores.addresses, id).await?;
                address.history.carry_over(&stored.history);
                address.history.audit(now());
                Ok(self.stores.addresses.update(address).await?)
            }
            None => {
                address.history.audit(now());
                Ok(self.stores.addresses.insert(address).await?)
            }
        }
    }

    pub async fn save_all(&self, addresses: Vec<Address>) -> ServiceResult<Vec<Address>> {
        let mut saved = Vec::with_capacity(addresses.len());
        for address in addresses {
            saved.push(self.save(address).await?);
        }
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: AddressId) -> ServiceResult<Address> {
        require(&*self.stores.addresses, id).await
    }

    /// `NotFound` when the person has no address.
    pub async fn find_by_person(&self, person_id: PersonId) -> ServiceResult<Vec<Address>> {
        let found: Vec<Address> = self
            .stores
            .addresses
            .list()
            .await?
            .into_iter()
            .filter(|a| a.person_id == Some(person_id))
            .collect();
        if found.is_empty() {
            return Err(DomainError::not_found(format!("no addresses found for person {person_id}")).into());
        }
        Ok(found)
    }

    pub async fn delete_by_id(&self, id: AddressId) -> ServiceResult<()> {
        require(&*self.stores.addresses, id).await?;
        self.stores.addresses.delete(id).await?;
        info!(address_id = %id, "address deleted");
        Ok(())
    }

    /// Returns how many addresses were removed.
    pub async fn delete_by_person(&self, person_id: PersonId) -> ServiceResult<usize> {
        let mut removed = 0;
        for a in self.stores.addresses.list().await? {
            if let (Some(id), Some(owner)) = (a.id, a.person_id) {
                if owner == person_id && self.stores.addresses.delete(id).await? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Distinct address kinds in use, sorted.
    pub async fn kinds(&self) -> ServiceResult<Vec<String>> {
        let kinds: BTreeSet<String> = self
            .stores
            .addresses
            .list()
            .await?
            .into_iter()
            .map(|a| a.kind.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Ok(kinds.into_iter().collect())
    }
}

#[derive(Clone)]
pub struct PhoneService {
    stores: Stores,
}

impl PhoneService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn save(&self, mut phone: Phone) -> ServiceResult<Phone> {
        phone.validate()?;
        match phone.id {
            Some(id) => {
                let stored = require(&*self.stores.phones, id).await?;
                phone.history.carry_over(&stored.history);
                phone.history.audit(now());
                Ok(self.stores.phones.update(phone).await?)
            }
            None => {
                phone.history.audit(now());
                Ok(self.stores.phones.insert(phone).await?)
            }
        }
    }

    pub async fn save_all(&self, phones: Vec<Phone>) -> ServiceResult<Vec<Phone>> {
        let mut saved = Vec::with_capacity(phones.len());
        for phone in phones {
            saved.push(self.save(phone).await?);
        }
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: PhoneId) -> ServiceResult<Phone> {
        require(&*self.stores.phones, id).await
    }

    pub async fn find_by_person(&self, person_id: PersonId) -> ServiceResult<Vec<Phone>> {
        Ok(self
            .stores
            .phones
            .list()
            .await?
            .into_iter()
            .filter(|p| p.person_id == Some(person_id))
            .collect())
    }

    pub async fn delete_by_id(&self, id: PhoneId) -> ServiceResult<()> {
        require(&*self.stores.phones, id).await?;
        self.stores.phones.delete(id).await?;
        info!(phone_id = %id, "phone deleted");
        Ok(())
    }

    pub async fn delete_by_person(&self, person_id: PersonId) -> ServiceResult<usize> {
        let mut removed = 0;
        for p in self.find_by_person(person_id).await? {
            if let Some(id) = p.id {
                if self.stores.phones.delete(id).await? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[derive(Clone)]
pub struct EmailService {
    stores: Stores,
}

impl EmailService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn save(&self, mut email: Email) -> ServiceResult<Email> {
        email.email = email.email.trim().to_string();
        email.validate()?;
        match email.id {
            Some(id) => {
                let stored = require(&*self.stores.emails, id).await?;
                email.history.carry_over(&stored.history);
                email.history.audit(now());
                Ok(self.stores.emails.update(email).await?)
            }
            None => {
                email.history.audit(now());
                Ok(self.stores.emails.insert(email).await?)
            }
        }
    }

    pub async fn save_all(&self, emails: Vec<Email>) -> ServiceResult<Vec<Email>> {
        let mut saved = Vec::with_capacity(emails.len());
        for email in emails {
            saved.push(self.save(email).await?);
        }
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: EmailId) -> ServiceResult<Email> {
        require(&*self.stores.emails, id).await
    }

    pub async fn find_by_person(&self, person_id: PersonId) -> ServiceResult<Vec<Email>> {
        Ok(self
            .stores
            .emails
            .list()
            .await?
            .into_iter()
            .filter(|e| e.person_id == Some(person_id))
            .collect())
    }

    pub async fn delete_by_id(&self, id: EmailId) -> ServiceResult<()> {
        require(&*self.stores.emails, id).await?;
        self.stores.emails.delete(id).await?;
        info!(email_id = %id, "email deleted");
        Ok(())
    }

    pub async fn delete_by_person(&self, person_id: PersonId) -> ServiceResult<usize> {
        let mut removed = 0;
        for e in self.find_by_person(person_id).await? {
            if let Some(id) = e.id {
                if self.stores.emails.delete(id).await? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::goiania;
    use crate::services::Registry;

    fn address(kind: &str, person: i64) -> Address {
        let mut a = Address::new("Rua 1", "Centro", goiania(), "10", None, "74000000", kind);
        a.person_id = Some(PersonId::new(person));
        a
    }

    #[tokio::test]
    async fn address_save_registers_city_and_state() {
        let reg = Registry::in_memory();
        let saved = reg.addresses().save(address("Residencial", 1)).await.unwrap();
        assert!(saved.id.is_some());
        assert!(saved.history.registered_at.is_some());
        let city = saved.city.unwrap();
        assert!(city.id.is_some());
        assert!(city.state.unwrap().id.is_some());
    }

    #[tokio::test]
    async fn address_without_city_is_rejected() {
        let reg = Registry::in_memory();
        let a = Address {
            city: None,
            ..address("Residencial", 1)
        };
        assert!(reg.addresses().save(a).await.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn find_by_person_and_kinds() {
        let reg = Registry::in_memory();
        reg.addresses()
            .save_all(vec![
                address("Residencial", 1),
                address("Comercial", 1),
                address("Residencial", 2),
            ])
            .await
            .unwrap();

        assert_eq!(reg.addresses().find_by_person(PersonId::new(1)).await.unwrap().len(), 2);
        assert!(reg
            .addresses()
            .find_by_person(PersonId::new(3))
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(reg.addresses().kinds().await.unwrap(), vec!["Comercial", "Residencial"]);

        assert_eq!(reg.addresses().delete_by_person(PersonId::new(1)).await.unwrap(), 2);
        assert_eq!(reg.addresses().kinds().await.unwrap(), vec!["Residencial"]);
    }

    #[tokio::test]
    async fn delete_missing_contact_is_not_found() {
        let reg = Registry::in_memory();
        assert!(reg.addresses().delete_by_id(AddressId::new(5)).await.unwrap_err().is_not_found());
        assert!(reg.phones().delete_by_id(PhoneId::new(5)).await.unwrap_err().is_not_found());
        assert!(reg.emails().delete_by_id(EmailId::new(5)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn phones_and_emails_by_person() {
        let reg = Registry::in_memory();
        let mut phone = Phone::new("62", "32324545", "Fixo");
        phone.person_id = Some(PersonId::new(4));
        let mut email = Email::new(" ana@example.com ", "Trabalho");
        email.person_id = Some(PersonId::new(4));

        reg.phones().save(phone).await.unwrap();
        let email = reg.emails().save(email).await.unwrap();
        assert_eq!(email.email, "ana@example.com");

        assert_eq!(reg.phones().find_by_person(PersonId::new(4)).await.unwrap().len(), 1);
        assert!(reg.emails().find_by_person(PersonId::new(9)).await.unwrap().is_empty());
        assert_eq!(reg.emails().delete_by_person(PersonId::new(4)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_phone_is_a_validation_error() {
        let reg = Registry::in_memory();
        let err = reg.phones().save(Phone::new("6", "12", "")).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
    }
}
