//! Endpoint Descriptor - 推理端点描述符
//!
//! 调用方随每个任务提交一份 JSON 描述符，指明要查询的上游模型端点
//! 和访问凭证：
//!
//! ```json
//! {
//!     "api_token": "your_token",
//!     "api_url": "https://api-inference.example.com/models/acme/musicgen-small"
//! }
//! ```
//!
//! 描述符只在单次调用内有效，不做任何持久化

use thiserror::Error;

/// 描述符解析错误
///
/// 两种失败都发生在任何网络调用之前
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// JSON 本身无法解析
    #[error("json_description is invalid: {0}")]
    InvalidJson(String),

    /// JSON 合法但缺少必需字段（或字段不是字符串）
    #[error("api_url or api_token missing from json_description: {0}")]
    MissingField(&'static str),
}

/// 推理端点描述符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Bearer 访问凭证
    pub api_token: String,
    /// 上游模型端点的绝对 URL
    pub api_url: String,
}

impl EndpointDescriptor {
    /// 从 UTF-8 JSON 字节解析描述符
    ///
    /// 先整体解析 JSON，再逐个取字段，使「JSON 非法」和「字段缺失」
    /// 成为可区分的错误
    pub fn from_slice(data: &[u8]) -> Result<Self, DescriptorError> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| DescriptorError::InvalidJson(e.to_string()))?;

        let api_token = required_string_field(&value, "api_token")?;
        let api_url = required_string_field(&value, "api_url")?;

        Ok(Self { api_token, api_url })
    }
}

fn required_string_field(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<String, DescriptorError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(DescriptorError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_descriptor() {
        let data = br#"{"api_token":"t","api_url":"http://x"}"#;
        let descriptor = EndpointDescriptor::from_slice(data).unwrap();
        assert_eq!(descriptor.api_token, "t");
        assert_eq!(descriptor.api_url, "http://x");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let data = br#"{"api_token":"t","api_url":"http://x","note":"ignored"}"#;
        assert!(EndpointDescriptor::from_slice(data).is_ok());
    }

    #[test]
    fn test_not_json_is_invalid() {
        let err = EndpointDescriptor::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_api_url() {
        let err = EndpointDescriptor::from_slice(br#"{"api_token":"t"}"#).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField("api_url")));
    }

    #[test]
    fn test_missing_api_token() {
        let err = EndpointDescriptor::from_slice(br#"{"api_url":"http://x"}"#).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField("api_token")));
    }

    #[test]
    fn test_non_string_field_counts_as_missing() {
        let err =
            EndpointDescriptor::from_slice(br#"{"api_token":42,"api_url":"http://x"}"#).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField("api_token")));
    }
}
