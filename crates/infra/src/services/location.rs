use tracing::{info, instrument};

use ebm_core::{CityId, DomainError, StateId};
use ebm_people::{City, State};

use super::{now, require, ServiceResult, Stores};

#[derive(Clone)]
pub struct StateService {
    stores: Stores,
}

impl StateService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Upserts by `uf`: a new state whose uf is already registered updates
    /// that record instead of duplicating it.
    #[instrument(skip(self, state), fields(uf = %state.uf))]
    pub async fn save(&self, mut state: State) -> ServiceResult<State> {
        state.normalize();
        state.validate()?;

        let same_uf = self.lookup_uf(&state.uf).await?;
        let stored = match (state.id, &same_uf) {
            (Some(id), Some(other)) if other.id != Some(id) => {
                return Err(DomainError::integrity(format!("uf {} already registered", state.uf)).into());
            }
            (Some(id), _) => Some(require(&*self.stores.states, id).await?),
            (None, existing) => existing.clone(),
        };

        let saved = match stored {
            Some(stored) => {
                state.id = stored.id;
                state.history.carry_over(&stored.history);
                state.history.audit(now());
                self.stores.states.update(state).await?
            }
            None => {
                state.history.audit(now());
                let saved = self.stores.states.insert(state).await?;
                info!(state_id = ?saved.id, "state registered");
                saved
            }
        };
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: StateId) -> ServiceResult<State> {
        require(&*self.stores.states, id).await
    }

    pub async fn find_by_uf(&self, uf: &str) -> ServiceResult<State> {
        self.lookup_uf(uf)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("state {} not found", uf.trim())).into())
    }

    /// All states ordered by name.
    pub async fn list(&self) -> ServiceResult<Vec<State>> {
        let mut states = self.stores.states.list().await?;
        states.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(states)
    }

    /// Fails with `DataIntegrity` while a city references the state.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: StateId) -> ServiceResult<()> {
        let state = require(&*self.stores.states, id).await?;
        if CityService::new(self.stores.clone()).exists_for_state(id).await? {
            return Err(DomainError::integrity(format!(
                "state {} still has cities",
                state.uf
            ))
            .into());
        }
        self.stores.states.delete(id).await?;
        info!(state_id = %id, "state deleted");
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<usize> {
        Ok(self.stores.states.list().await?.len())
    }

    async fn lookup_uf(&self, uf: &str) -> ServiceResult<Option<State>> {
        let uf = uf.trim();
        Ok(self
            .stores
            .states
            .list()
            .await?
            .into_iter()
            .find(|s| s.uf.eq_ignore_ascii_case(uf)))
    }
}

#[derive(Clone)]
pub struct CityService {
    stores: Stores,
}

impl CityService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Saves the state first, then the city. A new city matching an existing
    /// (name, uf) reuses that record.
    #[instrument(skip(self, city), fields(name = %city.name))]
    pub async fn save(&self, mut city: City) -> ServiceResult<City> {
        city.name = city.name.trim().to_string();
        city.validate()?;
        let state = city
            .state
            .take()
            .ok_or_else(|| DomainError::integrity("a city requires a state"))?;
        let state = StateService::new(self.stores.clone()).save(state).await?;

        let same_place = self
            .stores
            .cities
            .list()
            .await?
            .into_iter()
            .find(|c| c.same_place(&city.name, &state.uf));
        city.state = Some(state);

        let stored = match (city.id, same_place) {
            (Some(id), Some(other)) if other.id != Some(id) => {
                return Err(DomainError::integrity(format!(
                    "city {} already registered",
                    city.name
                ))
                .into());
            }
            (Some(id), _) => Some(require(&*self.stores.cities, id).await?),
            (None, existing) => existing,
        };

        let saved = match stored {
            Some(stored) => {
                city.id = stored.id;
                city.history.carry_over(&stored.history);
                city.history.audit(now());
                self.stores.cities.update(city).await?
            }
            None => {
                city.history.audit(now());
                let saved = self.stores.cities.insert(city).await?;
                info!(city_id = ?saved.id, "city registered");
                saved
            }
        };
        Ok(saved)
    }

    pub async fn save_all(&self, cities: Vec<City>) -> ServiceResult<Vec<City>> {
        let mut saved = Vec::with_capacity(cities.len());
        for city in cities {
            saved.push(self.save(city).await?);
        }
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: CityId) -> ServiceResult<City> {
        require(&*self.stores.cities, id).await
    }

    /// Cities of a state ordered by name; `NotFound` when there are none.
    pub async fn find_by_state(&self, uf: &str) -> ServiceResult<Vec<City>> {
        let uf = uf.trim();
        let mut cities: Vec<City> = self
            .stores
            .cities
            .list()
            .await?
            .into_iter()
            .filter(|c| c.uf().is_some_and(|u| u.eq_ignore_ascii_case(uf)))
            .collect();
        if cities.is_empty() {
            return Err(DomainError::not_found(format!("no cities found for state {uf}")).into());
        }
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cities)
    }

    /// Deletes the city, then its state when no other city still uses it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CityId) -> ServiceResult<()> {
        let city = require(&*self.stores.cities, id).await?;
        let in_use = self
            .stores
            .addresses
            .list()
            .await?
            .iter()
            .any(|a| a.city.as_ref().and_then(|c| c.id) == Some(id));
        if in_use {
            return Err(DomainError::integrity(format!("city {} is used by an address", city.name)).into());
        }

        self.stores.cities.delete(id).await?;
        info!(city_id = %id, "city deleted");

        if let Some(state_id) = city.state.and_then(|s| s.id) {
            match StateService::new(self.stores.clone()).delete(state_id).await {
                Ok(()) => {}
                Err(e) if e.is_integrity() || e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<usize> {
        Ok(self.stores.cities.list().await?.len())
    }

    pub async fn exists_for_state(&self, state_id: StateId) -> ServiceResult<bool> {
        Ok(self
            .stores
            .cities
            .list()
            .await?
            .iter()
            .any(|c| c.state.as_ref().and_then(|s| s.id) == Some(state_id)))
    }
}
