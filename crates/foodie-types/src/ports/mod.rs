pub mod address_repository;
pub mod carousel_repository;
pub mod order_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Everything the HTTP adapter needs from a single backing store.
pub trait Store:
    address_repository::AddressRepository
    + order_repository::OrderRepository
    + carousel_repository::CarouselRepository
    + Clone
{
}

impl<T> Store for T where
    T: address_repository::AddressRepository
        + order_repository::OrderRepository
        + carousel_repository::CarouselRepository
        + Clone
{
}
