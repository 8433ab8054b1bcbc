use std::net::SocketAddr;

use crate::service_config::MAX_UPLOAD_SIZE_BYTES;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Request body limit, uploads beyond this are refused with 413
    pub max_upload_size_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_BYTES,
        }
    }

    pub fn with_max_upload_size(mut self, max_upload_size_bytes: usize) -> Self {
        self.max_upload_size_bytes = max_upload_size_bytes;
        self
    }
}
