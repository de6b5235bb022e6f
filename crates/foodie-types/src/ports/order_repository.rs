use async_trait::async_trait;

use super::RepoError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::paging::PageRequest;

/// Order persistence. Soft-deleted orders are invisible to every read.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError>;

    /// Moves `id` from `expected` to `next` only if it is still in `expected`.
    /// Returns `false` when the guard did not match.
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepoError>;

    /// Soft-deletes `id` only if it is still in `expected`.
    async fn soft_delete(&self, id: &str, expected: OrderStatus) -> Result<bool, RepoError>;

    /// One page of a user's orders, newest first (ties by id), and the total
    /// number of matching orders.
    async fn page_by_user(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), RepoError>;

    /// Sparse per-status counts for a user; statuses with no orders may be absent.
    async fn count_by_status(&self, user_id: &str) -> Result<Vec<(OrderStatus, u64)>, RepoError>;
}
