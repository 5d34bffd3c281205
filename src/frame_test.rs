use super::*;

#[test]
fn request_sets_fields() {
    let frame = Frame::request("whiteboard:draw", Data::new());
    assert_eq!(frame.syscall, "whiteboard:draw");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn reply_inherits_context() {
    let req = Frame::request("whiteboard:erase", Data::new()).with_from("peer-2");
    let item = req.item(Data::new());

    assert_eq!(item.parent_id, Some(req.id));
    assert_ne!(item.id, req.id);
    assert!(item.from.is_none());
    assert_eq!(item.syscall, "whiteboard:erase");
    assert_eq!(item.status, Status::Item);
}

#[test]
fn status_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Status::Item).unwrap(), serde_json::json!("item"));
    let status: Status = serde_json::from_str("\"error\"").unwrap();
    assert_eq!(status, Status::Error);
}

#[test]
fn json_preserves_payload() {
    let original = Frame::request("whiteboard:draw", Data::new())
        .with_from("peer-1")
        .with_data("start_x", 10)
        .with_data("color", "#ff0000");

    let json = serde_json::to_string(&original).expect("serialize");
    let restored: Frame = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored, original);
    assert_eq!(restored.data.get("start_x").and_then(serde_json::Value::as_i64), Some(10));
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("canvas busy")]
    struct Busy;

    impl ErrorCode for Busy {
        fn error_code(&self) -> &'static str {
            "E_BUSY"
        }

        fn retryable(&self) -> bool {
            true
        }
    }

    let req = Frame::request("whiteboard:erase", Data::new());
    let err = req.error_from(&Busy);

    assert!(err.is_error());
    assert_eq!(err.code(), Some("E_BUSY"));
    assert_eq!(err.data.get("message").and_then(|v| v.as_str()), Some("canvas busy"));
    assert_eq!(err.data.get("retryable").and_then(serde_json::Value::as_bool), Some(true));
}

#[test]
fn item_is_not_an_error() {
    let req = Frame::request("whiteboard:draw", Data::new()).with_data("x", 1);
    let item = req.item(Data::new());
    assert!(!item.is_error());
    assert!(item.data.is_empty());
    assert_eq!(item.code(), None);
}
