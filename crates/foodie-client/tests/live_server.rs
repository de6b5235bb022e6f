use foodie_client::{ApiError, FoodieClient, PageSelect};
use foodie_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use foodie_repo::memory::InMemoryRepo;
use foodie_types::domain::address::AddressFields;
use foodie_types::domain::order::{Order, OrderItem, OrderStatus};
use foodie_types::ports::order_repository::OrderRepository;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn client_drives_a_running_server() {
    let repo = InMemoryRepo::new();
    let order = repo
        .create(
            Order::new(
                "u9".into(),
                vec![OrderItem {
                    name: "Hotpot".into(),
                    qty: 1,
                    unit_price_cents: 8800,
                }],
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let port = find_free_port();
    let server = HttpServer::new(
        AppState::with_defaults(repo),
        HttpServerConfig::new(port.to_string()),
    )
    .await
    .unwrap();
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = FoodieClient::new(&format!("http://127.0.0.1:{port}/")).unwrap();

    let address = client
        .add_address(
            "u9",
            AddressFields {
                receiver: "Zhao".into(),
                mobile: "18612345678".into(),
                province: "Beijing".into(),
                city: "Beijing".into(),
                district: "Haidian".into(),
                detail: "Zhongguancun 5".into(),
            },
        )
        .await
        .unwrap();
    assert!(address.is_default);

    // receiving before delivery is refused
    let err = client.confirm_received("u9", &order.id).await.unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().unwrap().status, 409);

    client.mark_delivered(&order.id).await.unwrap();
    client.confirm_received("u9", &order.id).await.unwrap();

    let counts = client.status_counts("u9").await.unwrap();
    assert_eq!(counts.get(OrderStatus::Received), 1);

    let grid = client
        .query_orders("u9", Some(OrderStatus::Received), PageSelect::new(1, 5))
        .await
        .unwrap();
    assert_eq!(grid.total_count, 1);
    assert_eq!(grid.page_size, 5);

    client.delete_order("u9", &order.id).await.unwrap();
    let trend = client.orders_trend("u9", PageSelect::default()).await.unwrap();
    assert_eq!(trend.total_count, 0);
    assert_eq!(trend.total_pages, 0);

    let err = client.delete_order("u9", &order.id).await.unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().unwrap().status, 404);

    handle.abort();
}
