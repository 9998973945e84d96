pub mod call_models;
pub mod call_response;

pub use call_models::{CallContext, CallRequest, CallValues, OAuth2App};
pub use call_response::{AppForm, CallResponse, Expand, ExpandLevel, FormField, FormSubmit};
