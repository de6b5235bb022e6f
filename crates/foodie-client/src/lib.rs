use std::time::Duration;

use anyhow::Context;
use foodie_types::domain::address::{Address, AddressFields};
use foodie_types::domain::carousel::Carousel;
use foodie_types::domain::order::{OrderStatus, OrderStatusCounts, OrderSummary};
use foodie_types::domain::paging::PagedResult;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

/// Failure reported by the server through the response envelope.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("server answered {status}: {msg}")]
pub struct ApiError {
    pub status: u16,
    pub msg: String,
}

#[derive(Clone)]
pub struct FoodieClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct FoodieClient {
    base: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: u16,
    msg: String,
    data: Option<T>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<String>,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// Page selection for the order grids. `None` leaves the server default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageSelect {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageSelect {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(p) = self.page {
            q.push(("page", p.to_string()));
        }
        if let Some(s) = self.page_size {
            q.push(("page_size", s.to_string()));
        }
        q
    }
}

// Non-2xx answers become `ApiError`; successful ones hand back the payload.
async fn read_envelope<T: DeserializeOwned>(res: reqwest::Response) -> anyhow::Result<Option<T>> {
    let code = res.status();
    if !code.is_success() {
        let err = match res.json::<Envelope<IgnoredAny>>().await {
            Ok(body) => ApiError {
                status: body.status,
                msg: body.msg,
            },
            Err(_) => ApiError {
                status: code.as_u16(),
                msg: code.canonical_reason().unwrap_or("unknown error").to_string(),
            },
        };
        tracing::debug!(status = err.status, msg = %err.msg, "request rejected");
        return Err(err.into());
    }
    let body: Envelope<T> = res.json().await.context("malformed response envelope")?;
    Ok(body.data)
}

async fn read_data<T: DeserializeOwned>(res: reqwest::Response) -> anyhow::Result<T> {
    read_envelope(res)
        .await?
        .context("response envelope carried no data")
}

impl FoodieClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<FoodieClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(FoodieClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn list_addresses(&self, user_id: &str) -> anyhow::Result<Vec<Address>> {
        let res = self
            .client
            .post(self.url("address/list")?)
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        read_data(res).await
    }

    pub async fn add_address(&self, user_id: &str, fields: AddressFields) -> anyhow::Result<Address> {
        let res = self
            .client
            .post(self.url("address/add")?)
            .json(&AddressRequest {
                user_id: user_id.into(),
                address_id: None,
                fields,
            })
            .send()
            .await?;
        read_data(res).await
    }

    pub async fn update_address(
        &self,
        user_id: &str,
        address_id: &str,
        fields: AddressFields,
    ) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("address/update")?)
            .json(&AddressRequest {
                user_id: user_id.into(),
                address_id: Some(address_id.into()),
                fields,
            })
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn delete_address(&self, user_id: &str, address_id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("address/delete")?)
            .query(&[("user_id", user_id), ("address_id", address_id)])
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn set_default_address(&self, user_id: &str, address_id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("address/set_default")?)
            .query(&[("user_id", user_id), ("address_id", address_id)])
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn status_counts(&self, user_id: &str) -> anyhow::Result<OrderStatusCounts> {
        let res = self
            .client
            .post(self.url("myorders/status_counts")?)
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        read_data(res).await
    }

    pub async fn query_orders(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: PageSelect,
    ) -> anyhow::Result<PagedResult<OrderSummary>> {
        let mut query = page.query();
        query.push(("user_id", user_id.to_string()));
        if let Some(s) = status {
            query.push(("order_status", s.as_str().to_string()));
        }
        let res = self
            .client
            .post(self.url("myorders/query")?)
            .query(&query)
            .send()
            .await?;
        read_data(res).await
    }

    pub async fn orders_trend(
        &self,
        user_id: &str,
        page: PageSelect,
    ) -> anyhow::Result<PagedResult<OrderSummary>> {
        let mut query = page.query();
        query.push(("user_id", user_id.to_string()));
        let res = self
            .client
            .post(self.url("myorders/trend")?)
            .query(&query)
            .send()
            .await?;
        read_data(res).await
    }

    pub async fn mark_delivered(&self, order_id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .get(self.url("myorders/deliver")?)
            .query(&[("order_id", order_id)])
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn confirm_received(&self, user_id: &str, order_id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("myorders/confirm_receive")?)
            .query(&[("user_id", user_id), ("order_id", order_id)])
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn delete_order(&self, user_id: &str, order_id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("myorders/delete")?)
            .query(&[("user_id", user_id), ("order_id", order_id)])
            .send()
            .await?;
        read_envelope::<IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn carousels(&self, is_show: bool) -> anyhow::Result<Vec<Carousel>> {
        let res = self
            .client
            .get(self.url("index/carousel")?)
            .query(&[("is_show", is_show)])
            .send()
            .await?;
        read_data(res).await
    }
}

impl FoodieClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<FoodieClient> {
        if let Some(client) = self.client {
            return Ok(FoodieClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(FoodieClient {
            base: self.base,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodie_types::domain::order::OrderItem;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fields() -> AddressFields {
        AddressFields {
            receiver: "Han Meimei".into(),
            mobile: "15912345678".into(),
            province: "Sichuan".into(),
            city: "Chengdu".into(),
            district: "Jinjiang".into(),
            detail: "Chunxi Road 8".into(),
        }
    }

    fn summary(status: OrderStatus) -> OrderSummary {
        OrderSummary {
            order_id: uuid::Uuid::new_v4().to_string(),
            status,
            items: vec![OrderItem {
                name: "Dumplings".into(),
                qty: 3,
                unit_price_cents: 1200,
            }],
            total_cents: 3600,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_and_list_addresses() {
        let server = MockServer::start();
        let address = Address::new("u1".into(), fields()).unwrap();

        let add_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/address/add")
                .json_body_obj(&AddressRequest {
                    user_id: "u1".into(),
                    address_id: None,
                    fields: fields(),
                });
            then.status(200)
                .json_body(json!({ "status": 200, "msg": "OK", "data": address }));
        });
        let list_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/address/list")
                .query_param("user_id", "u1");
            then.status(200)
                .json_body(json!({ "status": 200, "msg": "OK", "data": [address] }));
        });

        let client = FoodieClient::new(&server.base_url()).unwrap();
        let created = client.add_address("u1", fields()).await.unwrap();
        assert_eq!(created.id, address.id);
        let listed = client.list_addresses("u1").await.unwrap();
        assert_eq!(listed, vec![address]);

        add_mock.assert();
        list_mock.assert();
    }

    #[tokio::test]
    async fn query_sends_filter_and_paging() {
        let server = MockServer::start();
        let grid = PagedResult {
            items: vec![summary(OrderStatus::Delivered)],
            page: 2,
            page_size: 5,
            total_count: 6,
            total_pages: 2,
        };

        let query_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/myorders/query")
                .query_param("user_id", "u1")
                .query_param("order_status", "DELIVERED")
                .query_param("page", "2")
                .query_param("page_size", "5");
            then.status(200)
                .json_body(json!({ "status": 200, "msg": "OK", "data": grid }));
        });

        let client = FoodieClient::new(&server.base_url()).unwrap();
        let got = client
            .query_orders("u1", Some(OrderStatus::Delivered), PageSelect::new(2, 5))
            .await
            .unwrap();
        assert_eq!(got.total_count, 6);
        assert_eq!(got.items[0].status, OrderStatus::Delivered);

        query_mock.assert();
    }

    #[tokio::test]
    async fn envelope_errors_surface_as_api_error() {
        let server = MockServer::start();
        let confirm_mock = server.mock(|when, then| {
            when.method(POST).path("/myorders/confirm_receive");
            then.status(409).json_body(json!({
                "status": 409,
                "msg": "order cannot move from PLACED to RECEIVED",
                "data": null
            }));
        });
        let deliver_mock = server.mock(|when, then| {
            when.method(GET).path("/myorders/deliver");
            then.status(502).body("bad gateway");
        });

        let client = FoodieClient::new(&server.base_url()).unwrap();
        let err = client.confirm_received("u1", "o1").await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status, 409);
        assert!(api.msg.contains("PLACED"));

        let err = client.mark_delivered("o1").await.unwrap_err();
        assert_eq!(err.downcast_ref::<ApiError>().unwrap().status, 502);

        confirm_mock.assert();
        deliver_mock.assert();
    }

    #[tokio::test]
    async fn unit_endpoints_accept_empty_data() {
        let server = MockServer::start();
        let ok = json!({ "status": 200, "msg": "OK", "data": null });
        let set_default = server.mock(|when, then| {
            when.method(POST)
                .path("/address/set_default")
                .query_param("address_id", "a1");
            then.status(200).json_body(ok.clone());
        });
        let delete = server.mock(|when, then| {
            when.method(POST)
                .path("/myorders/delete")
                .query_param("order_id", "o1");
            then.status(200).json_body(ok.clone());
        });

        let client = FoodieClient::builder(&server.base_url())
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_header("x-client", "tests")
            .unwrap()
            .build()
            .unwrap();
        client.set_default_address("u1", "a1").await.unwrap();
        client.delete_order("u1", "o1").await.unwrap();

        set_default.assert();
        delete.assert();
    }
}
