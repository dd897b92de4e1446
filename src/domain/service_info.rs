//! Service Info - 服务注册描述文档
//!
//! 向编排引擎注册时发送的自描述文档：服务的输入/输出 schema、
//! 能力标签和状态。引擎据此调度任务并校验输入输出类型。

use serde::Serialize;

/// 输入/输出字段的媒体类型
pub mod media_type {
    pub const APPLICATION_JSON: &str = "application/json";
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const AUDIO_OGG: &str = "audio/ogg";
}

/// 服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Available,
    Unavailable,
}

/// 字段描述（名称 + 可接受的媒体类型）
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescription {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub types: Vec<&'static str>,
}

/// 能力标签
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionUnitTag {
    pub name: &'static str,
    pub acronym: &'static str,
}

/// 服务注册描述文档
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub slug: &'static str,
    /// 本服务的公开 URL，引擎通过它提交任务
    pub url: String,
    pub summary: &'static str,
    pub description: &'static str,
    pub status: ServiceStatus,
    pub data_in_fields: Vec<FieldDescription>,
    pub data_out_fields: Vec<FieldDescription>,
    pub tags: Vec<ExecutionUnitTag>,
    pub has_ai: bool,
}

const SUMMARY: &str = "Query text-to-audio models exposed by a model-hub inference API";

const DESCRIPTION: &str = "\
This service forwards a text prompt to a hub-hosted text-to-audio model and \
returns the generated audio as an Ogg container.

It takes two inputs:
- json_description: a JSON document naming the model endpoint and the access \
token, e.g. {\"api_token\": \"your_token\", \"api_url\": \
\"https://api-inference.example.com/models/acme/musicgen-small\"}
- input_text: the plain-text generation prompt.

The model may need some time to load on the hub's side; the first attempt can \
fail with a loading error. Hub responses are cached per input, so retrying \
with a slightly different prompt is the quickest way to check whether the \
model has finished loading.";

impl ServiceInfo {
    /// 构造本服务的描述文档
    ///
    /// `public_url` 是本服务对外可达的 Base URL（见 ServerConfig）
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            name: "Hub text-to-audio",
            slug: "hub-text-to-audio",
            url: public_url.into(),
            summary: SUMMARY,
            description: DESCRIPTION,
            status: ServiceStatus::Available,
            data_in_fields: vec![
                FieldDescription {
                    name: "json_description",
                    types: vec![media_type::APPLICATION_JSON],
                },
                FieldDescription {
                    name: "input_text",
                    types: vec![media_type::TEXT_PLAIN],
                },
            ],
            data_out_fields: vec![FieldDescription {
                name: "result",
                types: vec![media_type::AUDIO_OGG],
            }],
            tags: vec![
                ExecutionUnitTag {
                    name: "Natural Language Processing",
                    acronym: "NLP",
                },
                ExecutionUnitTag {
                    name: "Audio Generation",
                    acronym: "AG",
                },
            ],
            has_ai: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_info_schema() {
        let info = ServiceInfo::new("http://localhost:5070");
        assert_eq!(info.slug, "hub-text-to-audio");
        assert_eq!(info.data_in_fields.len(), 2);
        assert_eq!(info.data_in_fields[0].name, "json_description");
        assert_eq!(info.data_in_fields[1].name, "input_text");
        assert_eq!(info.data_out_fields[0].types, vec![media_type::AUDIO_OGG]);
        assert!(info.has_ai);
    }

    #[test]
    fn test_service_info_serializes_type_key() {
        let info = ServiceInfo::new("http://localhost:5070");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["data_in_fields"][0]["type"][0], "application/json");
        assert_eq!(json["data_out_fields"][0]["name"], "result");
    }
}
