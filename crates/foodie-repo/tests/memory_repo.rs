#![cfg(feature = "memory")]

use chrono::{Duration, Utc};
use foodie_repo::memory::InMemoryRepo;
use foodie_types::domain::address::{Address, AddressFields};
use foodie_types::domain::carousel::{Carousel, CarouselKind};
use foodie_types::domain::order::{Order, OrderItem, OrderStatus};
use foodie_types::domain::paging::PageRequest;
use foodie_types::ports::address_repository::AddressRepository;
use foodie_types::ports::carousel_repository::CarouselRepository;
use foodie_types::ports::order_repository::OrderRepository;

fn order_for(user: &str, status: OrderStatus, minutes_ago: i64) -> Order {
    let mut order = Order::new(
        user.into(),
        vec![OrderItem {
            name: "Dumplings".into(),
            qty: 2,
            unit_price_cents: 500,
        }],
    )
    .unwrap();
    order.status = status;
    order.created_at = Utc::now() - Duration::minutes(minutes_ago);
    order.updated_at = order.created_at;
    order
}

fn address_for(user: &str) -> Address {
    Address::new(
        user.into(),
        AddressFields {
            receiver: "Han Meimei".into(),
            mobile: "13912345678".into(),
            province: "Guangdong".into(),
            city: "Shenzhen".into(),
            district: "Nanshan".into(),
            detail: "Keji Road 8".into(),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_order_lifecycle_flow() {
    let repo = InMemoryRepo::new();
    let order = repo
        .create(order_for("u1", OrderStatus::Placed, 0))
        .await
        .unwrap();

    let fetched = repo.get(&order.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.total_cents, 1000);

    assert!(repo
        .compare_and_set_status(&order.id, OrderStatus::Placed, OrderStatus::Delivered)
        .await
        .unwrap());
    // guard no longer matches
    assert!(!repo
        .compare_and_set_status(&order.id, OrderStatus::Placed, OrderStatus::Delivered)
        .await
        .unwrap());
    assert!(!repo.soft_delete(&order.id, OrderStatus::Received).await.unwrap());

    assert!(repo
        .compare_and_set_status(&order.id, OrderStatus::Delivered, OrderStatus::Received)
        .await
        .unwrap());
    assert!(repo.soft_delete(&order.id, OrderStatus::Received).await.unwrap());
    assert!(repo.get(&order.id).await.unwrap().is_none());
    assert!(!repo.soft_delete(&order.id, OrderStatus::Received).await.unwrap());
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    assert!(repo.get("nope").await.unwrap().is_none());
    assert!(!repo
        .compare_and_set_status("nope", OrderStatus::Placed, OrderStatus::Delivered)
        .await
        .unwrap());
    assert!(!repo.soft_delete("nope", OrderStatus::Closed).await.unwrap());
    assert!(repo.find("u1", "nope").await.unwrap().is_none());
    assert!(!repo.set_default("u1", "nope").await.unwrap());
    assert!(!repo.delete("u1", "nope").await.unwrap());
}

#[tokio::test]
async fn memory_repo_pages_newest_first_and_filters() {
    let repo = InMemoryRepo::new();
    let statuses = [
        OrderStatus::Placed,
        OrderStatus::Delivered,
        OrderStatus::Placed,
        OrderStatus::Received,
        OrderStatus::Placed,
    ];
    let mut ids = Vec::new();
    for (i, st) in statuses.iter().enumerate() {
        let o = repo.create(order_for("u1", *st, i as i64)).await.unwrap();
        ids.push(o.id);
    }
    repo.create(order_for("someone-else", OrderStatus::Placed, 0))
        .await
        .unwrap();

    let (first, total) = repo
        .page_by_user("u1", None, PageRequest::new(Some(1), Some(2), 10))
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(
        first.iter().map(|o| o.id.clone()).collect::<Vec<_>>(),
        vec![ids[0].clone(), ids[1].clone()]
    );

    let (last, _) = repo
        .page_by_user("u1", None, PageRequest::new(Some(3), Some(2), 10))
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].id, ids[4]);

    let (placed, total) = repo
        .page_by_user("u1", Some(OrderStatus::Placed), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert!(placed.iter().all(|o| o.status == OrderStatus::Placed));

    let (beyond, total) = repo
        .page_by_user("u1", None, PageRequest::new(Some(9), Some(2), 10))
        .await
        .unwrap();
    assert!(beyond.is_empty());
    assert_eq!(total, 5);
}

#[tokio::test]
async fn memory_repo_ties_break_on_id() {
    let repo = InMemoryRepo::new();
    let at = Utc::now();
    for _ in 0..3 {
        let mut o = order_for("u1", OrderStatus::Placed, 0);
        o.created_at = at;
        repo.create(o).await.unwrap();
    }
    let (page, _) = repo
        .page_by_user("u1", None, PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.iter().map(|o| o.id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn memory_repo_counts_skip_deleted_orders() {
    let repo = InMemoryRepo::new();
    for st in [OrderStatus::Placed, OrderStatus::Placed, OrderStatus::Delivered] {
        repo.create(order_for("u1", st, 0)).await.unwrap();
    }
    let gone = repo
        .create(order_for("u1", OrderStatus::Closed, 0))
        .await
        .unwrap();
    repo.soft_delete(&gone.id, OrderStatus::Closed).await.unwrap();

    let mut counts = repo.count_by_status("u1").await.unwrap();
    counts.sort();
    assert_eq!(
        counts,
        vec![(OrderStatus::Placed, 2), (OrderStatus::Delivered, 1)]
    );
    assert!(repo.count_by_status("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_repo_first_address_is_default() {
    let repo = InMemoryRepo::new();
    let first = repo.insert(address_for("u1")).await.unwrap();
    let second = repo.insert(address_for("u1")).await.unwrap();
    let other_user = repo.insert(address_for("u2")).await.unwrap();
    assert!(first.is_default);
    assert!(!second.is_default);
    assert!(other_user.is_default);

    let listed = repo.list_by_user("u1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
}

#[tokio::test]
async fn memory_repo_set_default_is_exclusive() {
    let repo = InMemoryRepo::new();
    let a = repo.insert(address_for("u1")).await.unwrap();
    let b = repo.insert(address_for("u1")).await.unwrap();
    let c = repo.insert(address_for("u1")).await.unwrap();

    assert!(repo.set_default("u1", &c.id).await.unwrap());
    let defaults: Vec<_> = repo
        .list_by_user("u1")
        .await
        .unwrap()
        .into_iter()
        .filter(|x| x.is_default)
        .map(|x| x.id)
        .collect();
    assert_eq!(defaults, vec![c.id.clone()]);

    // foreign user cannot claim the address
    assert!(!repo.set_default("u2", &b.id).await.unwrap());

    // updates never touch the flag
    let mut edited = repo.find("u1", &a.id).await.unwrap().unwrap();
    edited.is_default = true;
    edited.detail = "Keji Road 9".into();
    assert!(repo.update(&edited).await.unwrap());
    let stored = repo.find("u1", &a.id).await.unwrap().unwrap();
    assert_eq!(stored.detail, "Keji Road 9");
    assert!(!stored.is_default);

    assert!(repo.delete("u1", &c.id).await.unwrap());
    assert!(repo
        .list_by_user("u1")
        .await
        .unwrap()
        .iter()
        .all(|x| !x.is_default));
}

#[tokio::test]
async fn memory_repo_carousels_by_visibility() {
    let repo = InMemoryRepo::new();
    let second = Carousel::new("b.png".into(), "#fff".into(), CarouselKind::Item, 2)
        .unwrap()
        .linking_item("item-2");
    let first = Carousel::new("a.png".into(), "#000".into(), CarouselKind::Category, 1)
        .unwrap()
        .linking_category(51);
    let hidden = Carousel::new("c.png".into(), "#333".into(), CarouselKind::Item, 0)
        .unwrap()
        .hidden();
    for c in [second.clone(), first.clone(), hidden.clone()] {
        repo.save(c).await.unwrap();
    }

    let shown = repo.list_by_visibility(true).await.unwrap();
    assert_eq!(shown, vec![first, second]);
    let not_shown = repo.list_by_visibility(false).await.unwrap();
    assert_eq!(not_shown, vec![hidden]);
}
