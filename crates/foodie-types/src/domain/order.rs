use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an order.
///
/// Transitions only move forward along the table in [`OrderStatus::next_allowed`];
/// `Cancelled` is reachable from `Placed` alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Delivered,
    Received,
    Closed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Delivered,
        OrderStatus::Received,
        OrderStatus::Closed,
        OrderStatus::Cancelled,
    ];

    /// States reachable in one step from `self`.
    pub fn next_allowed(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Placed => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered => &[OrderStatus::Received],
            OrderStatus::Received => &[OrderStatus::Closed],
            OrderStatus::Closed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_allowed().contains(&next)
    }

    /// Received and closed orders may be removed from the user's listings.
    pub fn is_deletable(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown order status: {s}"))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub name: String,
    pub qty: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: String, items: Vec<OrderItem>) -> anyhow::Result<Self> {
        if user_id.trim().is_empty() {
            anyhow::bail!("user_id empty");
        }
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        for it in &items {
            if it.qty == 0 {
                anyhow::bail!("item qty must be > 0");
            }
        }
        let total = items
            .iter()
            .map(|it| (it.qty as i64) * it.unit_price_cents)
            .sum();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            items,
            total_cents: total,
            status: OrderStatus::Placed,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Checks `next` against the transition table without mutating.
    pub fn check_transition(&self, next: OrderStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to: next,
            })
        }
    }

    pub fn transition(&mut self, next: OrderStatus) -> Result<(), TransitionError> {
        self.check_transition(next)?;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Listing projection of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderSummary {
    fn from(o: Order) -> Self {
        Self {
            order_id: o.id,
            status: o.status,
            items: o.items,
            total_cents: o.total_cents,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Per-status order counts. Always holds an entry for every status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OrderStatusCounts(BTreeMap<OrderStatus, u64>);

impl OrderStatusCounts {
    pub fn from_counts(counts: impl IntoIterator<Item = (OrderStatus, u64)>) -> Self {
        let mut map: BTreeMap<OrderStatus, u64> =
            OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for (status, n) in counts {
            *map.entry(status).or_insert(0) += n;
        }
        Self(map)
    }

    pub fn get(&self, status: OrderStatus) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderStatus, u64)> + '_ {
        self.0.iter().map(|(s, n)| (*s, *n))
    }
}
