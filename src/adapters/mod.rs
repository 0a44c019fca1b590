//! Hosting adapters.
//!
//! Each serverless front end has its own request/response object model. An
//! adapter converts that model to and from the neutral types in
//! [`crate::http`]; the core never depends on a concrete adapter.

pub mod edge;
pub mod function_event;

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

pub use edge::EdgeAdapter;
pub use function_event::{FunctionEvent, FunctionEventAdapter, FunctionReply};

pub trait HostAdapter {
    /// What the platform hands us.
    type Event;
    /// What the platform expects back.
    type Reply;

    fn to_core_request(&self, event: Self::Event) -> Result<HttpRequest>;

    fn from_core_response(&self, response: HttpResponse) -> Self::Reply;
}
