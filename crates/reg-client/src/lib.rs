pub mod api;
pub mod error;
pub mod http;

pub use api::{CheckinApi, CheckinMethod, CheckinRecord, FormsApi};
pub use error::{ApiError, ProblemDetails};
pub use http::HttpApi;
