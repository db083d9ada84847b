mod error;
mod middleware;
mod response;

pub use error::AppError;
pub use middleware::{MAX_LOGIN_BODY_BYTES, gate_middleware, setup_login};
pub use response::into_http_response;
