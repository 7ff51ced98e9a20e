mod client;
mod transport;

pub use client::{HttpTransport, API_KEY_HEADER};
pub use transport::{get_header_value, ApiRequest, ApiResponse, Method, Transport};
