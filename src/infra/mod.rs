pub mod article_store;
pub mod http_client;
