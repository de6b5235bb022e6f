use crate::errors::AppError;
use foodie_types::domain::carousel::Carousel;
use foodie_types::ports::carousel_repository::CarouselRepository;

pub struct CarouselService<R: CarouselRepository> {
    repo: R,
}

impl<R: CarouselRepository> CarouselService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn query_all(&self, is_show: bool) -> Result<Vec<Carousel>, AppError> {
        Ok(self.repo.list_by_visibility(is_show).await?)
    }
}
