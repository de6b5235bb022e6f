use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a carousel slide links to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CarouselKind {
    Item,
    Category,
}

/// Home page carousel slide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Carousel {
    pub id: String,
    pub image_url: String,
    pub background_color: String,
    pub item_id: Option<String>,
    pub cat_id: Option<i64>,
    pub kind: CarouselKind,
    pub sort: i32,
    pub is_show: bool,
    pub created_at: DateTime<Utc>,
}

impl Carousel {
    pub fn new(
        image_url: String,
        background_color: String,
        kind: CarouselKind,
        sort: i32,
    ) -> anyhow::Result<Self> {
        if image_url.trim().is_empty() {
            anyhow::bail!("image_url empty");
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            image_url,
            background_color,
            item_id: None,
            cat_id: None,
            kind,
            sort,
            is_show: true,
            created_at: Utc::now(),
        })
    }

    pub fn linking_item(mut self, item_id: impl Into<String>) -> Self {
        self.kind = CarouselKind::Item;
        self.item_id = Some(item_id.into());
        self
    }

    pub fn linking_category(mut self, cat_id: i64) -> Self {
        self.kind = CarouselKind::Category;
        self.cat_id = Some(cat_id);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_show = false;
        self
    }
}
