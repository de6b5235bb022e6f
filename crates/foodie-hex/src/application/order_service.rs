use crate::application::require;
use crate::errors::AppError;
use foodie_types::domain::order::{Order, OrderStatus};
use foodie_types::ports::order_repository::OrderRepository;

/// Order lifecycle engine: every status change goes through here.
pub struct OrderService<R: OrderRepository> {
    repo: R,
}

fn not_found(order_id: &str) -> AppError {
    AppError::NotFound(format!("order {order_id}"))
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Fetches an order the caller owns. Someone else's order is reported
    /// exactly like a missing one.
    async fn owned_order(&self, user_id: &str, order_id: &str) -> Result<Order, AppError> {
        match self.repo.get(order_id).await? {
            Some(o) if o.is_owned_by(user_id) => Ok(o),
            Some(_) => {
                tracing::warn!(user_id, order_id, "order belongs to another user");
                Err(not_found(order_id))
            }
            None => Err(not_found(order_id)),
        }
    }

    async fn advance(&self, order: &Order, next: OrderStatus) -> Result<(), AppError> {
        order
            .check_transition(next)
            .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

        let applied = self
            .repo
            .compare_and_set_status(&order.id, order.status, next)
            .await?;
        if !applied {
            // Lost the race: someone moved the order after we read it.
            tracing::debug!(order_id = %order.id, expected = %order.status, "status guard failed");
            return Err(AppError::InvalidTransition(format!(
                "order {} is no longer {}",
                order.id, order.status
            )));
        }

        tracing::info!(order_id = %order.id, from = %order.status, to = %next, "order status changed");
        Ok(())
    }

    /// Merchant ships the order. Simulated; no ownership check.
    pub async fn mark_delivered(&self, order_id: &str) -> Result<(), AppError> {
        require("order_id", order_id)?;
        let order = self
            .repo
            .get(order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;
        self.advance(&order, OrderStatus::Delivered).await
    }

    pub async fn confirm_received(&self, user_id: &str, order_id: &str) -> Result<(), AppError> {
        require("user_id", user_id)?;
        require("order_id", order_id)?;
        let order = self.owned_order(user_id, order_id).await?;
        self.advance(&order, OrderStatus::Received).await
    }

    /// Removes a received or closed order from the user's listings.
    pub async fn delete_order(&self, user_id: &str, order_id: &str) -> Result<(), AppError> {
        require("user_id", user_id)?;
        require("order_id", order_id)?;
        let order = self.owned_order(user_id, order_id).await?;
        if !order.status.is_deletable() {
            return Err(AppError::InvalidTransition(format!(
                "order in status {} cannot be deleted",
                order.status
            )));
        }

        if !self.repo.soft_delete(&order.id, order.status).await? {
            return match self.repo.get(order_id).await? {
                None => Err(not_found(order_id)),
                Some(now) => Err(AppError::InvalidTransition(format!(
                    "order {} changed to {} while deleting",
                    order_id, now.status
                ))),
            };
        }

        tracing::info!(user_id, order_id, "order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodie_types::domain::order::OrderItem;

    async fn seeded(status: OrderStatus) -> (foodie_repo::memory::InMemoryRepo, Order) {
        let repo = foodie_repo::memory::InMemoryRepo::new();
        let mut order = Order::new(
            "u1".into(),
            vec![OrderItem {
                name: "Hotpot".into(),
                qty: 1,
                unit_price_cents: 4200,
            }],
        )
        .unwrap();
        order.status = status;
        let order = repo.create(order).await.unwrap();
        (repo, order)
    }

    async fn status_of(repo: &foodie_repo::memory::InMemoryRepo, id: &str) -> OrderStatus {
        repo.get(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn deliver_then_confirm() {
        let (repo, order) = seeded(OrderStatus::Placed).await;
        let svc = OrderService::new(repo.clone());

        svc.mark_delivered(&order.id).await.unwrap();
        assert_eq!(status_of(&repo, &order.id).await, OrderStatus::Delivered);

        svc.confirm_received("u1", &order.id).await.unwrap();
        assert_eq!(status_of(&repo, &order.id).await, OrderStatus::Received);
    }

    #[tokio::test]
    async fn mark_delivered_requires_placed() {
        for st in [
            OrderStatus::Delivered,
            OrderStatus::Received,
            OrderStatus::Closed,
            OrderStatus::Cancelled,
        ] {
            let (repo, order) = seeded(st).await;
            let svc = OrderService::new(repo.clone());
            let res = svc.mark_delivered(&order.id).await;
            assert!(matches!(res, Err(AppError::InvalidTransition(_))));
            assert_eq!(status_of(&repo, &order.id).await, st);
        }
    }

    #[tokio::test]
    async fn confirm_requires_delivered() {
        let (repo, order) = seeded(OrderStatus::Placed).await;
        let svc = OrderService::new(repo.clone());
        let res = svc.confirm_received("u1", &order.id).await;
        assert!(matches!(res, Err(AppError::InvalidTransition(_))));
        assert_eq!(status_of(&repo, &order.id).await, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn foreign_user_sees_not_found() {
        let (repo, order) = seeded(OrderStatus::Delivered).await;
        let svc = OrderService::new(repo.clone());

        let res = svc.confirm_received("u2", &order.id).await;
        let missing = svc.confirm_received("u2", "no-such-order").await;
        match (res, missing) {
            (Err(AppError::NotFound(a)), Err(AppError::NotFound(_))) => {
                assert!(!a.contains("u1"));
            }
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(status_of(&repo, &order.id).await, OrderStatus::Delivered);

        let res = svc.delete_order("u2", &order.id).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_only_in_terminal_state() {
        let (repo, order) = seeded(OrderStatus::Delivered).await;
        let svc = OrderService::new(repo.clone());
        let res = svc.delete_order("u1", &order.id).await;
        assert!(matches!(res, Err(AppError::InvalidTransition(_))));

        svc.confirm_received("u1", &order.id).await.unwrap();
        svc.delete_order("u1", &order.id).await.unwrap();
        assert!(repo.get(&order.id).await.unwrap().is_none());

        let again = svc.delete_order("u1", &order.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn closed_orders_are_deletable() {
        let (repo, order) = seeded(OrderStatus::Closed).await;
        let svc = OrderService::new(repo.clone());
        svc.delete_order("u1", &order.id).await.unwrap();
        assert!(repo.get(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_ids_are_invalid_input() {
        let svc = OrderService::new(foodie_repo::memory::InMemoryRepo::new());
        assert!(matches!(
            svc.mark_delivered(" ").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.confirm_received("", "o1").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.delete_order("u1", "").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.mark_delivered("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
