use async_trait::async_trait;

use super::RepoError;
use crate::domain::carousel::Carousel;

#[async_trait]
pub trait CarouselRepository: Send + Sync + 'static {
    async fn save(&self, carousel: Carousel) -> Result<Carousel, RepoError>;
    /// Ordered by `sort` ascending.
    async fn list_by_visibility(&self, is_show: bool) -> Result<Vec<Carousel>, RepoError>;
}
