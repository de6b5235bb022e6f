pub mod envelope;
pub mod extract;
mod server;

pub use server::{
    AddressParams, AddressRequest, AppState, CarouselParams, HttpServer, HttpServerConfig,
    OrderParams, QueryParams, UserParams,
};
