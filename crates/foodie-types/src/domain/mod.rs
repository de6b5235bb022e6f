pub mod address;
pub mod carousel;
pub mod order;
pub mod paging;
