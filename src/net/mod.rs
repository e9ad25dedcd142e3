pub mod cors;
pub mod event;
pub mod response;
pub mod server;

pub use event::{Body, HttpEvent, InboundEvent, Query};
pub use response::{Response, ResponseWriter};
