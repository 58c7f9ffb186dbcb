pub mod form_relay;
pub mod stats_client;
