use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use foodie_types::domain::address::Address;
use foodie_types::domain::carousel::{Carousel, CarouselKind};
use foodie_types::domain::order::{Order, OrderItem, OrderStatus};
use foodie_types::domain::paging::PageRequest;
use foodie_types::ports::address_repository::AddressRepository;
use foodie_types::ports::carousel_repository::CarouselRepository;
use foodie_types::ports::order_repository::OrderRepository;
use foodie_types::ports::RepoError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

/// How long a writer waits for the database lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: [&str; 5] = [
    include_str!("../migrations/0001_create_orders.sql"),
    include_str!("../migrations/0002_index_orders_user.sql"),
    include_str!("../migrations/0003_create_addresses.sql"),
    include_str!("../migrations/0004_unique_default_address.sql"),
    include_str!("../migrations/0005_create_carousels.sql"),
];

const ORDER_COLUMNS: &str =
    "id, user_id, items_json, total_cents, status, is_deleted, created_at, updated_at";
const ADDRESS_COLUMNS: &str =
    "id, user_id, receiver, mobile, province, city, district, detail, is_default, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl ToString) -> RepoError {
    RepoError::DbError(e.to_string())
}

// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    total_cents: i64,
    status: String,
    is_deleted: bool,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let items: Vec<OrderItem> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total_cents: self.total_cents,
            status,
            is_deleted: self.is_deleted,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbAddress {
    id: String,
    user_id: String,
    receiver: String,
    mobile: String,
    province: String,
    city: String,
    district: String,
    detail: String,
    is_default: bool,
    created_at: String,
    updated_at: String,
}

impl DbAddress {
    fn into_address(self) -> Result<Address, RepoError> {
        Ok(Address {
            id: self.id,
            user_id: self.user_id,
            receiver: self.receiver,
            mobile: self.mobile,
            province: self.province,
            city: self.city,
            district: self.district,
            detail: self.detail,
            is_default: self.is_default,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbCarousel {
    id: String,
    image_url: String,
    background_color: String,
    item_id: Option<String>,
    cat_id: Option<i64>,
    kind: String,
    sort: i64,
    is_show: bool,
    created_at: String,
}

impl DbCarousel {
    fn into_carousel(self) -> Result<Carousel, RepoError> {
        let kind = match self.kind.as_str() {
            "item" => CarouselKind::Item,
            "category" => CarouselKind::Category,
            other => return Err(RepoError::DbError(format!("unknown carousel kind {other}"))),
        };
        Ok(Carousel {
            id: self.id,
            image_url: self.image_url,
            background_color: self.background_color,
            item_id: self.item_id,
            cat_id: self.cat_id,
            kind,
            sort: i32::try_from(self.sort).map_err(db_err)?,
            is_show: self.is_show,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(url = database_url, "sqlite store ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, items_json, total_cents, status, is_deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(items_json)
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(order.is_deleted)
        .bind(ts(order.created_at))
        .bind(ts(order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepoError> {
        let res = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ?
             WHERE id = ? AND status = ? AND is_deleted = 0",
        )
        .bind(next.as_str())
        .bind(ts(Utc::now()))
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() == 1)
    }

    async fn soft_delete(&self, id: &str, expected: OrderStatus) -> Result<bool, RepoError> {
        let res = sqlx::query(
            "UPDATE orders SET is_deleted = 1, updated_at = ?
             WHERE id = ? AND status = ? AND is_deleted = 0",
        )
        .bind(ts(Utc::now()))
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() == 1)
    }

    async fn page_by_user(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        let status_s = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders
             WHERE user_id = ? AND is_deleted = 0 AND (? IS NULL OR status = ?)",
        )
        .bind(user_id)
        .bind(status_s)
        .bind(status_s)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let limit = i64::try_from(page.limit()).map_err(db_err)?;
        let offset = i64::try_from(page.offset()).map_err(db_err)?;
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = ? AND is_deleted = 0 AND (? IS NULL OR status = ?)
             ORDER BY created_at DESC, id ASC
             LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(status_s)
        .bind(status_s)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let orders = rows
            .into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((orders, total.max(0) as u64))
    }

    async fn count_by_status(&self, user_id: &str) -> Result<Vec<(OrderStatus, u64)>, RepoError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM orders
             WHERE user_id = ? AND is_deleted = 0
             GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|(s, n)| -> Result<(OrderStatus, u64), RepoError> {
                Ok((OrderStatus::from_str(&s).map_err(db_err)?, n.max(0) as u64))
            })
            .collect()
    }
}

#[async_trait]
impl AddressRepository for SqliteRepo {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Address>, RepoError> {
        let rows: Vec<DbAddress> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_address())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, address: Address) -> Result<Address, RepoError> {
        // The first-address check and the insert are one statement.
        sqlx::query(
            "INSERT INTO addresses (id, user_id, receiver, mobile, province, city, district, detail, is_default, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, NOT EXISTS (SELECT 1 FROM addresses WHERE user_id = ?), ?, ?",
        )
        .bind(&address.id)
        .bind(&address.user_id)
        .bind(&address.receiver)
        .bind(&address.mobile)
        .bind(&address.province)
        .bind(&address.city)
        .bind(&address.district)
        .bind(&address.detail)
        .bind(&address.user_id)
        .bind(ts(address.created_at))
        .bind(ts(address.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.find(&address.user_id, &address.id)
            .await?
            .ok_or_else(|| RepoError::DbError(format!("address {} missing after insert", address.id)))
    }

    async fn find(&self, user_id: &str, id: &str) -> Result<Option<Address>, RepoError> {
        let row: Option<DbAddress> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_address()).transpose()
    }

    async fn update(&self, address: &Address) -> Result<bool, RepoError> {
        let res = sqlx::query(
            "UPDATE addresses
             SET receiver = ?, mobile = ?, province = ?, city = ?, district = ?, detail = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&address.receiver)
        .bind(&address.mobile)
        .bind(&address.province)
        .bind(&address.city)
        .bind(&address.district)
        .bind(&address.detail)
        .bind(ts(address.updated_at))
        .bind(&address.id)
        .bind(&address.user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM addresses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_default(&self, user_id: &str, id: &str) -> Result<bool, RepoError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        // Take the write lock up front so concurrent callers wait on the busy timeout.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

        let outcome = swap_default(&mut conn, user_id, id).await;
        let finish = match outcome {
            Ok(true) => "COMMIT",
            _ => "ROLLBACK",
        };
        if let Err(e) = sqlx::query(finish).execute(&mut *conn).await {
            // A connection stuck inside a transaction must not go back to the pool.
            drop(conn.detach());
            return Err(db_err(e));
        }
        outcome
    }
}

/// Clears the user's other defaults and flags `id`. Runs inside the caller's
/// transaction; `false` when the user has no such address.
async fn swap_default(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
) -> Result<bool, RepoError> {
    let now = ts(Utc::now());
    sqlx::query(
        "UPDATE addresses SET is_default = 0, updated_at = ?
         WHERE user_id = ? AND is_default = 1 AND id <> ?",
    )
    .bind(&now)
    .bind(user_id)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    let res = sqlx::query(
        "UPDATE addresses SET is_default = 1, updated_at = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(&now)
    .bind(id)
    .bind(user_id)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(res.rows_affected() > 0)
}

#[async_trait]
impl CarouselRepository for SqliteRepo {
    async fn save(&self, carousel: Carousel) -> Result<Carousel, RepoError> {
        let kind = match carousel.kind {
            CarouselKind::Item => "item",
            CarouselKind::Category => "category",
        };
        sqlx::query(
            "INSERT INTO carousels (id, image_url, background_color, item_id, cat_id, kind, sort, is_show, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&carousel.id)
        .bind(&carousel.image_url)
        .bind(&carousel.background_color)
        .bind(&carousel.item_id)
        .bind(carousel.cat_id)
        .bind(kind)
        .bind(i64::from(carousel.sort))
        .bind(carousel.is_show)
        .bind(ts(carousel.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(carousel)
    }

    async fn list_by_visibility(&self, is_show: bool) -> Result<Vec<Carousel>, RepoError> {
        let rows: Vec<DbCarousel> = sqlx::query_as(
            "SELECT id, image_url, background_color, item_id, cat_id, kind, sort, is_show, created_at
             FROM carousels WHERE is_show = ? ORDER BY sort ASC, created_at ASC",
        )
        .bind(is_show)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_carousel())
            .collect::<Result<Vec<_>, _>>()
    }
}
