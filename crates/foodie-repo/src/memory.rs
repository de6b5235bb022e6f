use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use foodie_types::domain::address::Address;
use foodie_types::domain::carousel::Carousel;
use foodie_types::domain::order::{Order, OrderStatus};
use foodie_types::domain::paging::PageRequest;
use foodie_types::ports::address_repository::AddressRepository;
use foodie_types::ports::carousel_repository::CarouselRepository;
use foodie_types::ports::order_repository::OrderRepository;
use foodie_types::ports::RepoError;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process store. Addresses are grouped per user so that every
/// multi-address write runs under that user's entry lock.
#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<String, Order>>,
    pub addresses: Arc<DashMap<String, Vec<Address>>>,
    pub carousels: Arc<DashMap<String, Carousel>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            addresses: Arc::new(DashMap::new()),
            carousels: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        Ok(self
            .orders
            .get(id)
            .filter(|o| !o.is_deleted)
            .map(|o| o.clone()))
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepoError> {
        if let Some(mut o) = self.orders.get_mut(id) {
            if o.is_deleted || o.status != expected {
                return Ok(false);
            }
            return Ok(o.transition(next).is_ok());
        }
        Ok(false)
    }

    async fn soft_delete(&self, id: &str, expected: OrderStatus) -> Result<bool, RepoError> {
        if let Some(mut o) = self.orders.get_mut(id) {
            if o.is_deleted || o.status != expected {
                return Ok(false);
            }
            o.is_deleted = true;
            o.updated_at = Utc::now();
            return Ok(true);
        }
        Ok(false)
    }

    async fn page_by_user(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        let mut matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| {
                let o = kv.value();
                !o.is_deleted && o.user_id == user_id && status.map_or(true, |s| o.status == s)
            })
            .map(|kv| kv.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn count_by_status(&self, user_id: &str) -> Result<Vec<(OrderStatus, u64)>, RepoError> {
        let mut counts: HashMap<OrderStatus, u64> = HashMap::new();
        for kv in self.orders.iter() {
            let o = kv.value();
            if !o.is_deleted && o.user_id == user_id {
                *counts.entry(o.status).or_insert(0) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl AddressRepository for InMemoryRepo {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Address>, RepoError> {
        let mut list = self
            .addresses
            .get(user_id)
            .map(|v| v.clone())
            .unwrap_or_default();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn insert(&self, mut address: Address) -> Result<Address, RepoError> {
        let mut owned = self.addresses.entry(address.user_id.clone()).or_default();
        address.is_default = owned.is_empty();
        owned.push(address.clone());
        Ok(address)
    }

    async fn find(&self, user_id: &str, id: &str) -> Result<Option<Address>, RepoError> {
        Ok(self
            .addresses
            .get(user_id)
            .and_then(|v| v.iter().find(|a| a.id == id).cloned()))
    }

    async fn update(&self, address: &Address) -> Result<bool, RepoError> {
        let Some(mut owned) = self.addresses.get_mut(&address.user_id) else {
            return Ok(false);
        };
        match owned.iter_mut().find(|a| a.id == address.id) {
            Some(stored) => {
                // the default flag is owned by set_default/insert
                let is_default = stored.is_default;
                let created_at = stored.created_at;
                *stored = address.clone();
                stored.is_default = is_default;
                stored.created_at = created_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        let Some(mut owned) = self.addresses.get_mut(user_id) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|a| a.id != id);
        Ok(owned.len() < before)
    }

    async fn set_default(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        let Some(mut owned) = self.addresses.get_mut(user_id) else {
            return Ok(false);
        };
        if !owned.iter().any(|a| a.id == id) {
            return Ok(false);
        }
        let now = Utc::now();
        for a in owned.iter_mut() {
            let flag = a.id == id;
            if a.is_default != flag {
                a.is_default = flag;
                a.updated_at = now;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CarouselRepository for InMemoryRepo {
    async fn save(&self, carousel: Carousel) -> Result<Carousel, RepoError> {
        self.carousels.insert(carousel.id.clone(), carousel.clone());
        Ok(carousel)
    }

    async fn list_by_visibility(&self, is_show: bool) -> Result<Vec<Carousel>, RepoError> {
        let mut list: Vec<Carousel> = self
            .carousels
            .iter()
            .filter(|kv| kv.value().is_show == is_show)
            .map(|kv| kv.value().clone())
            .collect();
        list.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(list)
    }
}
