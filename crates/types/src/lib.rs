pub mod provision;
pub mod request;
pub mod status;

pub use provision::*;
pub use request::*;
pub use status::*;
