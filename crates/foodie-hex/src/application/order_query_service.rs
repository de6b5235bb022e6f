use crate::application::require;
use crate::errors::AppError;
use foodie_types::domain::order::{OrderStatus, OrderStatusCounts, OrderSummary};
use foodie_types::domain::paging::{PageRequest, PagedResult, DEFAULT_PAGE_SIZE};
use foodie_types::ports::order_repository::OrderRepository;

/// Read-only views over a user's orders.
pub struct OrderQueryService<R: OrderRepository> {
    repo: R,
    default_page_size: u32,
}

impl<R: OrderRepository> OrderQueryService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    async fn page(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<PagedResult<OrderSummary>, AppError> {
        require("user_id", user_id)?;
        let req = PageRequest::new(page, page_size, self.default_page_size);
        let (orders, total) = self.repo.page_by_user(user_id, status, req).await?;
        tracing::debug!(user_id, ?status, page = req.page, total, "orders page");
        Ok(PagedResult::new(orders, req, total).map(OrderSummary::from))
    }

    /// Newest first, optionally restricted to one status.
    pub async fn query_orders(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<PagedResult<OrderSummary>, AppError> {
        self.page(user_id, status, page, page_size).await
    }

    pub async fn status_counts(&self, user_id: &str) -> Result<OrderStatusCounts, AppError> {
        require("user_id", user_id)?;
        let counts = self.repo.count_by_status(user_id).await?;
        Ok(OrderStatusCounts::from_counts(counts))
    }

    /// Activity history: every live order, newest first.
    pub async fn orders_trend(
        &self,
        user_id: &str,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<PagedResult<OrderSummary>, AppError> {
        self.page(user_id, None, page, page_size).await
    }
}
