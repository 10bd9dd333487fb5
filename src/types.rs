use serde::{Deserialize, Serialize};

/// A server-side conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe_description: Option<String>,
}

/// Who authored a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    /// Any role string the service adds later.
    #[serde(untagged)]
    Other(String),
}

impl MessageRole {
    /// Label used in the printed transcript.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "USER",
            _ => "TAILOR",
        }
    }
}

/// A message posted to a session. Only `id` is guaranteed on the
/// response to a send; listed messages carry `role` and `content` too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// A generated output tied to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub storage_url: String,
    /// The artifact this one was derived from, if any. `null` and a
    /// missing field both decode to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_artifact_id: Option<String>,
}

/// Body of `POST /api/sessions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest<'a> {
    pub vibe_description: &'a str,
}

/// Body of `POST /api/sessions/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
    pub author_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_with_source() {
        let a: Artifact = serde_json::from_str(
            r#"{"id":"a2","type":"image","storageUrl":"https://cdn/a2.png","sourceArtifactId":"a1","createdAt":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(a.kind, "image");
        assert_eq!(a.storage_url, "https://cdn/a2.png");
        assert_eq!(a.source_artifact_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_artifact_null_source() {
        let a: Artifact = serde_json::from_str(
            r#"{"id":"a1","type":"image","storageUrl":"u","sourceArtifactId":null}"#,
        )
        .unwrap();
        assert!(a.source_artifact_id.is_none());

        let b: Artifact =
            serde_json::from_str(r#"{"id":"a1","type":"image","storageUrl":"u"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_message_roles() {
        let msgs: Vec<Message> = serde_json::from_str(
            r#"[
                {"id":"1","role":"user","content":"hi"},
                {"id":"2","role":"assistant","content":"hello"},
                {"id":"3","role":"tailor","content":"custom"}
            ]"#,
        )
        .unwrap();
        assert_eq!(msgs[0].role, Some(MessageRole::User));
        assert_eq!(msgs[0].role.as_ref().unwrap().label(), "USER");
        assert_eq!(msgs[1].role.as_ref().unwrap().label(), "TAILOR");
        assert_eq!(msgs[2].role, Some(MessageRole::Other("tailor".into())));
        assert_eq!(msgs[2].role.as_ref().unwrap().label(), "TAILOR");
    }

    #[test]
    fn test_send_response_only_id() {
        let m: Message = serde_json::from_str(r#"{"id":"m1"}"#).unwrap();
        assert_eq!(m.id, "m1");
        assert!(m.role.is_none());
        assert!(m.content.is_empty());
    }

    #[test]
    fn test_request_bodies_are_camel_case() {
        let json = serde_json::to_string(&CreateSessionRequest {
            vibe_description: "simple geometric pattern",
        })
        .unwrap();
        assert_eq!(json, r#"{"vibeDescription":"simple geometric pattern"}"#);

        let json = serde_json::to_string(&SendMessageRequest {
            content: "hello",
            author_name: "TestUser",
        })
        .unwrap();
        assert_eq!(json, r#"{"content":"hello","authorName":"TestUser"}"#);
    }
}
