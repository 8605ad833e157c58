pub mod js_executor;
pub mod render_gateway;

#[cfg(test)]
pub mod fake;

pub use js_executor::JsExecutor;
pub use render_gateway::{RenderGateway, RenderSession, WaitCondition};
