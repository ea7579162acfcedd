pub mod bus_adapter;
pub mod http_adapter;
pub mod journal;

pub use bus_adapter::RdKafkaBusPublisher;
pub use http_adapter::ReqwestHttpClient;
pub use journal::SqlxJournal;
