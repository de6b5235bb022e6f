use crate::application::require;
use crate::errors::AppError;
use foodie_types::domain::address::{Address, AddressFields};
use foodie_types::ports::address_repository::AddressRepository;

pub struct AddressService<R: AddressRepository> {
    repo: R,
}

fn not_found(address_id: &str) -> AppError {
    AppError::NotFound(format!("address {address_id}"))
}

impl<R: AddressRepository> AddressService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn list_addresses(&self, user_id: &str) -> Result<Vec<Address>, AppError> {
        require("user_id", user_id)?;
        Ok(self.repo.list_by_user(user_id).await?)
    }

    /// The user's first address becomes the default.
    pub async fn add_address(
        &self,
        user_id: &str,
        fields: AddressFields,
    ) -> Result<Address, AppError> {
        require("user_id", user_id)?;
        let address = Address::new(user_id.to_owned(), fields)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let stored = self.repo.insert(address).await?;
        tracing::info!(user_id, address_id = %stored.id, is_default = stored.is_default, "address added");
        Ok(stored)
    }

    pub async fn update_address(
        &self,
        user_id: &str,
        address_id: &str,
        fields: AddressFields,
    ) -> Result<(), AppError> {
        require("user_id", user_id)?;
        require("address_id", address_id)?;
        fields
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut address = self
            .repo
            .find(user_id, address_id)
            .await?
            .ok_or_else(|| not_found(address_id))?;
        address
            .apply(fields)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if !self.repo.update(&address).await? {
            return Err(not_found(address_id));
        }
        tracing::info!(user_id, address_id, "address updated");
        Ok(())
    }

    /// Deleting an unknown address is a no-op.
    pub async fn delete_address(&self, user_id: &str, address_id: &str) -> Result<(), AppError> {
        require("user_id", user_id)?;
        require("address_id", address_id)?;
        let removed = self.repo.delete(user_id, address_id).await?;
        tracing::info!(user_id, address_id, removed, "address delete");
        Ok(())
    }

    pub async fn set_default_address(
        &self,
        user_id: &str,
        address_id: &str,
    ) -> Result<(), AppError> {
        require("user_id", user_id)?;
        require("address_id", address_id)?;
        if !self.repo.set_default(user_id, address_id).await? {
            return Err(not_found(address_id));
        }
        tracing::info!(user_id, address_id, "default address set");
        Ok(())
    }
}
