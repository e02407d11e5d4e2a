//! Unified chat-completion interface types and traits.
//!
//! This crate provides the shared types used to talk to an
//! OpenAI-compatible completion endpoint: `Message`, `Request`,
//! `Response`, the `Complete` provider trait, plus `HttpProvider` for
//! the real transport and `ScriptedProvider` for tests and offline use.
//! Upstream failures are mapped to user-facing causes by [`classify`].

pub use error::{UpstreamError, UpstreamErrorKind, classify};
pub use http::HttpProvider;
pub use message::{Message, Role};
pub use provider::Complete;
pub use request::Request;
pub use response::{Choice, FinishReason, Response, ResponseMessage, Usage};
pub use reqwest::{self, Client};
pub use script::ScriptedProvider;

mod error;
mod http;
mod message;
mod provider;
mod request;
mod response;
mod script;
