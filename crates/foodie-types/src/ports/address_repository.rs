use async_trait::async_trait;

use super::RepoError;
use crate::domain::address::Address;

/// Address persistence, always scoped to the owning user.
#[async_trait]
pub trait AddressRepository: Send + Sync + 'static {
    /// Oldest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Address>, RepoError>;

    /// Persists `address`; it is stored as the default when the user owns no
    /// other address. The returned value carries the stored flag.
    async fn insert(&self, address: Address) -> Result<Address, RepoError>;

    async fn find(&self, user_id: &str, id: &str) -> Result<Option<Address>, RepoError>;

    /// Writes the editable fields of an existing address. `false` if absent.
    async fn update(&self, address: &Address) -> Result<bool, RepoError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, RepoError>;

    /// Clears the flag on every sibling and sets it on `id` in one step.
    /// `false` (and no change) when `id` is not one of the user's addresses.
    async fn set_default(&self, user_id: &str, id: &str) -> Result<bool, RepoError>;
}
