//! Inference Client 适配器

mod fake_inference_client;
mod http_inference_client;

pub use fake_inference_client::FakeInferenceClient;
pub use http_inference_client::{HttpInferenceClient, HttpInferenceClientConfig};
