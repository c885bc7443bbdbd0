pub mod http;
pub mod items;
#[cfg(test)]
pub mod test_support;

pub use http::{
    ApiClientConfig, ApiError, Format, HttpClient, Payload, Request, RequestClient,
};
pub use items::{fetch_item_list, load_items, ItemDescriptor};
