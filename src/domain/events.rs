//! Listener invocation.
//!
//! Every call into a [`ProxyListener`] goes through [`dispatch`], which turns a
//! failing or panicking hook into a logged [`ProxyError::Observer`] so that an
//! observer can never break the data path.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use super::{Direction, ProxyError, Result};
use crate::ports::ProxyListener;

#[derive(Debug, Clone, Copy)]
pub enum ProxyEvent<'a> {
    Start,
    Stop,
    Request(&'a [u8]),
    Response(&'a [u8]),
}

impl<'a> ProxyEvent<'a> {
    pub fn data(direction: Direction, bytes: &'a [u8]) -> Self {
        match direction {
            Direction::Request => ProxyEvent::Request(bytes),
            Direction::Response => ProxyEvent::Response(bytes),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProxyEvent::Start => "start",
            ProxyEvent::Stop => "stop",
            ProxyEvent::Request(_) => "request",
            ProxyEvent::Response(_) => "response",
        }
    }
}

/// Deliver `event` to `listener`. The returned error has already been logged.
pub fn dispatch(listener: &dyn ProxyListener, event: ProxyEvent<'_>) -> Result<()> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event {
        ProxyEvent::Start => listener.on_start(),
        ProxyEvent::Stop => listener.on_stop(),
        ProxyEvent::Request(bytes) => listener.on_request(bytes),
        ProxyEvent::Response(bytes) => listener.on_response(bytes),
    }));

    let result = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => match err {
            ProxyError::Observer(_) => err,
            other => ProxyError::Observer(other.to_string()),
        },
        Err(payload) => ProxyError::Observer(format!("hook panicked: {}", panic_message(&*payload))),
    };

    warn!(event = event.name(), error = %result, "listener hook failed, forwarding continues");
    Err(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
