#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use foodie_types::domain::address::Address;
use foodie_types::domain::carousel::Carousel;
use foodie_types::domain::order::{Order, OrderStatus};
use foodie_types::domain::paging::PageRequest;
use foodie_types::ports::address_repository::AddressRepository;
use foodie_types::ports::carousel_repository::CarouselRepository;
use foodie_types::ports::order_repository::OrderRepository;
use foodie_types::ports::RepoError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_SQLITE_URL: &str = "sqlite://foodie.db";

// SQLite wins when both features are enabled.
#[cfg(feature = "sqlite")]
type Backend = sqlite::SqliteRepo;
#[cfg(all(feature = "memory", not(feature = "sqlite")))]
type Backend = memory::InMemoryRepo;

/// Store facade over the backend selected by the enabled features.
#[derive(Clone)]
pub struct Repo {
    backend: Backend,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        tracing::info!("using in-memory store");
        Ok(Self {
            backend: memory::InMemoryRepo::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        tracing::info!(url, "using sqlite store");
        let backend = sqlite::SqliteRepo::new(url).await?;
        Ok(Self { backend })
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.backend.create(order).await
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        self.backend.get(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepoError> {
        self.backend.compare_and_set_status(id, expected, next).await
    }

    async fn soft_delete(&self, id: &str, expected: OrderStatus) -> Result<bool, RepoError> {
        self.backend.soft_delete(id, expected).await
    }

    async fn page_by_user(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        self.backend.page_by_user(user_id, status, page).await
    }

    async fn count_by_status(&self, user_id: &str) -> Result<Vec<(OrderStatus, u64)>, RepoError> {
        self.backend.count_by_status(user_id).await
    }
}

#[async_trait::async_trait]
impl AddressRepository for Repo {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Address>, RepoError> {
        self.backend.list_by_user(user_id).await
    }

    async fn insert(&self, address: Address) -> Result<Address, RepoError> {
        self.backend.insert(address).await
    }

    async fn find(&self, user_id: &str, id: &str) -> Result<Option<Address>, RepoError> {
        self.backend.find(user_id, id).await
    }

    async fn update(&self, address: &Address) -> Result<bool, RepoError> {
        self.backend.update(address).await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        self.backend.delete(user_id, id).await
    }

    async fn set_default(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        self.backend.set_default(user_id, id).await
    }
}

#[async_trait::async_trait]
impl CarouselRepository for Repo {
    async fn save(&self, carousel: Carousel) -> Result<Carousel, RepoError> {
        self.backend.save(carousel).await
    }

    async fn list_by_visibility(&self, is_show: bool) -> Result<Vec<Carousel>, RepoError> {
        self.backend.list_by_visibility(is_show).await
    }
}
