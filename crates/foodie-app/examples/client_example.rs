///  To run :
///  cargo r --example client_example
use foodie_client::{ApiError, FoodieClient, PageSelect};
use foodie_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use foodie_repo::build_repo;
use foodie_types::domain::address::AddressFields;
use foodie_types::domain::order::OrderStatus;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("foodie.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let server = HttpServer::new(
        AppState::with_defaults(repo),
        HttpServerConfig::new(port.to_string()),
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = FoodieClient::new(&addr)?;
    let home = client
        .add_address(
            "demo-user",
            AddressFields {
                receiver: "Demo".into(),
                mobile: "13800138000".into(),
                province: "Guangdong".into(),
                city: "Shenzhen".into(),
                district: "Nanshan".into(),
                detail: "Keyuan Road 1".into(),
            },
        )
        .await?;
    println!("Added address id={} default={}", home.id, home.is_default);

    let mut office = AddressFields {
        receiver: "Demo".into(),
        mobile: "13800138000".into(),
        province: "Guangdong".into(),
        city: "Shenzhen".into(),
        district: "Futian".into(),
        detail: "Shennan Blvd 2".into(),
    };
    let office_addr = client.add_address("demo-user", office.clone()).await?;
    client.set_default_address("demo-user", &office_addr.id).await?;

    office.mobile = "0755".into();
    match client.update_address("demo-user", &office_addr.id, office).await {
        Ok(()) => println!("Unexpectedly accepted a bad mobile"),
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => println!("Rejected update: {} {}", api.status, api.msg),
            None => return Err(err),
        },
    }

    for a in client.list_addresses("demo-user").await? {
        println!("  {} {} default={}", a.id, a.district, a.is_default);
    }

    let counts = client.status_counts("demo-user").await?;
    println!(
        "Orders: {} total, {} placed",
        counts.total(),
        counts.get(OrderStatus::Placed)
    );

    let grid = client.orders_trend("demo-user", PageSelect::default()).await?;
    println!(
        "Trend page {}/{} with {} orders",
        grid.page, grid.total_pages, grid.total_count
    );

    let banners = client.carousels(true).await?;
    println!("Carousel entries shown: {}", banners.len());

    handle.abort();
    Ok(())
}
