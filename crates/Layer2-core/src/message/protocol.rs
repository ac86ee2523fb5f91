//! Message Protocol - 프런트엔드 ↔ 백엔드 메시지 형식
//!
//! ```json
//! {"type": "GET_ENV_LIST", "payload": {...}, "expectsReply": true, "requestId": 7}
//! {"type": "GET_ENV_LIST_Response", "payload": {...}, "requestId": 7}
//! ```

use hzero_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 기본 응답 접미사
pub const DEFAULT_REPLY_SUFFIX: &str = "_Response";

/// 응답 type 생성 (요청 type + 접미사)
pub fn reply_marker(msg_type: &str, suffix: &str) -> String {
    format!("{}{}", msg_type, suffix)
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// ReplyError
// ============================================================================

/// 응답에 실리는 에러 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    /// `Error::kind()` 태그
    pub kind: String,
    pub message: String,
}

impl From<&Error> for ReplyError {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            kind: err.kind().to_string(),
            message,
        }
    }
}

impl From<ReplyError> for Error {
    fn from(err: ReplyError) -> Self {
        Error::remote(err.kind, err.message)
    }
}

// ============================================================================
// Message
// ============================================================================

/// 채널 위의 단일 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub expects_reply: bool,

    /// 요청/응답 상관 ID (구버전 peer는 생략)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl Message {
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: None,
            expects_reply: false,
            request_id: None,
            error: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// 응답을 기대하는 요청
    pub fn request(msg_type: impl Into<String>, payload: Option<Value>, request_id: u64) -> Self {
        Self {
            payload,
            expects_reply: true,
            request_id: Some(request_id),
            ..Self::new(msg_type)
        }
    }

    /// 응답 없는 단방향 알림
    pub fn notification(msg_type: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            payload,
            ..Self::new(msg_type)
        }
    }

    /// 이 요청에 대한 응답 생성 (requestId 복사)
    pub fn reply(&self, suffix: &str, result: Result<Value>) -> Self {
        let mut reply = Self::new(reply_marker(&self.msg_type, suffix));
        reply.request_id = self.request_id;
        match result {
            Ok(Value::Null) => {}
            Ok(payload) => reply.payload = Some(payload),
            Err(e) => reply.error = Some(ReplyError::from(&e)),
        }
        reply
    }

    /// payload 필드 조회 (`payload.key`)
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(key))
    }

    /// payload 문자열 필드 조회
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload_field(key).and_then(Value::as_str)
    }

    /// 응답 결과로 변환 (error가 있으면 Remote 에러)
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.payload.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// NDJSON codec
// ============================================================================

/// 메시지 한 줄 인코딩 (개행 미포함)
pub fn encode_line(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// 한 줄 디코딩
pub fn decode_line(line: &str) -> Result<Message> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::InvalidInput("Empty message line".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let msg = Message::request("GET_ENV_LIST", None, 7);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({"type": "GET_ENV_LIST", "expectsReply": true, "requestId": 7})
        );
    }

    #[test]
    fn test_legacy_message_decodes() {
        let msg = decode_line(r#"{"type":"TOKEN_UPDATE","payload":"abc"}"#).unwrap();
        assert_eq!(msg.msg_type, "TOKEN_UPDATE");
        assert!(!msg.expects_reply);
        assert_eq!(msg.request_id, None);
        assert_eq!(msg.payload, Some(json!("abc")));
    }

    #[test]
    fn test_reply_copies_id_and_marker() {
        let request = Message::request("CHECK_PERMISSIONS", None, 3);
        let reply = request.reply(DEFAULT_REPLY_SUFFIX, Ok(json!(true)));
        assert_eq!(reply.msg_type, "CHECK_PERMISSIONS_Response");
        assert_eq!(reply.request_id, Some(3));
        assert_eq!(reply.into_result().unwrap(), json!(true));
    }

    #[test]
    fn test_error_reply() {
        let request = Message::request("CREATE_ENV", None, 1);
        let reply = request.reply(
            DEFAULT_REPLY_SUFFIX,
            Err(Error::Validation("bad host".to_string())),
        );
        let line = encode_line(&reply).unwrap();
        assert!(line.contains(r#""kind":"validation""#));

        let err = decode_line(&line).unwrap().into_result().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_decode_rejects_blank_and_garbage() {
        assert!(matches!(decode_line("   "), Err(Error::InvalidInput(_))));
        assert!(matches!(decode_line("not json"), Err(Error::Json(_))));
    }
}
