pub mod http_transport;
pub mod naming;
pub mod transport;
