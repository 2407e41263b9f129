//! Unit tests for request planning, body encoding and response decoding.

use rstest::{fixture, rstest};
use serde_json::json;

use super::request::{Destination, json_body, plan_batch};
use super::response::{SendResult, decode_body};
use super::*;
use crate::config::MessageFormat;
use crate::error::{ApiError, ConfigError, InputError, NotifyError};

/// Endpoint nothing listens on; tests using it must fail before any request.
const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9/v1/messages";

#[fixture]
fn client() -> WebexClient {
    let config = WebexConfig::new("token-abc", "room-123").expect("config should build");
    WebexClient::new(config)
        .expect("client should build")
        .with_endpoint(UNREACHABLE_ENDPOINT)
}

fn attachment(name: &str) -> Attachment {
    Attachment::from_bytes(name, name.as_bytes().to_vec(), None)
}

#[rstest]
#[case("user@example.com", "toPersonEmail")]
#[case("first.last+tag@sub.example.org", "toPersonEmail")]
#[case("Y2lzY29zcGFyazovL3VzL1JPT00vYWJj", "roomId")]
#[case("user @example.com", "roomId")]
#[case("user@example.com\t", "roomId")]
fn destination_field_depends_on_shape(#[case] raw: &str, #[case] field: &str) {
    let destination = Destination::classify(raw);
    assert_eq!(destination.field_name(), field);
    assert_eq!(destination.value(), raw);
}

#[rstest]
fn plan_without_attachments_is_single_text_request() {
    let batch = plan_batch(Some("hello"), Vec::new());
    assert_eq!(batch.len(), 1);
    let only = batch.first().expect("batch should not be empty");
    assert_eq!(only.text.as_deref(), Some("hello"));
    assert!(only.attachment.is_none());
}

#[rstest]
fn plan_attaches_message_to_first_file_only() {
    let batch = plan_batch(
        Some("see files"),
        vec![attachment("a.txt"), attachment("b.txt"), attachment("c.txt")],
    );

    let shapes: Vec<_> = batch
        .iter()
        .map(|outgoing| {
            (
                outgoing.text.as_deref(),
                outgoing
                    .attachment
                    .as_ref()
                    .and_then(|file| file.filename.as_deref()),
            )
        })
        .collect();
    assert_eq!(
        shapes,
        vec![
            (Some("see files"), Some("a.txt")),
            (None, Some("b.txt")),
            (None, Some("c.txt")),
        ]
    );
}

#[rstest]
fn plan_with_attachments_and_no_message() {
    let batch = plan_batch(None, vec![attachment("a.txt"), attachment("b.txt")]);
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|outgoing| outgoing.text.is_none()));
}

#[rstest]
#[case(MessageFormat::Markdown, json!({ "roomId": "room-1", "markdown": "**hi**" }))]
#[case(MessageFormat::Text, json!({ "roomId": "room-1", "text": "**hi**" }))]
fn json_body_uses_format_field(#[case] format: MessageFormat, #[case] expected: Value) {
    let destination = Destination::classify("room-1");
    assert_eq!(json_body(&destination, format, Some("**hi**")), expected);
}

#[rstest]
fn json_body_omits_absent_message() {
    let destination = Destination::classify("user@example.com");
    assert_eq!(
        json_body(&destination, MessageFormat::Markdown, None),
        json!({ "toPersonEmail": "user@example.com" })
    );
}

#[rstest]
fn decode_body_returns_json_for_success() {
    let value = decode_body(200, r#"{"id":"msg-1"}"#).expect("body should decode");
    assert_eq!(value, json!({ "id": "msg-1" }));
}

#[rstest]
#[case(400)]
#[case(401)]
#[case(503)]
fn decode_body_maps_error_statuses(#[case] status: u16) {
    let result = decode_body(status, "nope");
    let Err(NotifyError::Api(ApiError::Status {
        status: reported,
        body,
    })) = result
    else {
        panic!("expected an API status error");
    };
    assert_eq!(reported, status);
    assert_eq!(body, "nope");
}

#[rstest]
fn decode_body_rejects_non_json_success() {
    let result = decode_body(200, "<html>ok</html>");
    assert!(matches!(
        result,
        Err(NotifyError::Api(ApiError::InvalidResponse { status: 200, .. }))
    ));
}

#[rstest]
fn send_result_single_for_one_response() {
    let result = SendResult::from_responses(vec![json!({ "id": "1" })]);
    assert_eq!(result, SendResult::Single(json!({ "id": "1" })));
    assert_eq!(result.responses().len(), 1);
}

#[rstest]
fn send_result_batch_keeps_order() {
    let result = SendResult::from_responses(vec![json!({ "id": "1" }), json!({ "id": "2" })]);
    assert_eq!(
        result.clone().into_responses(),
        vec![json!({ "id": "1" }), json!({ "id": "2" })]
    );
    assert_eq!(
        serde_json::to_value(&result).expect("result should serialise"),
        json!([{ "id": "1" }, { "id": "2" }])
    );
}

#[rstest]
fn new_client_defaults_to_public_endpoint() {
    let config = WebexConfig::new("t", "d").expect("config should build");
    let built = WebexClient::new(config).expect("client should build");
    assert_eq!(built.endpoint(), WEBEX_API_MESSAGES);
}

#[rstest]
fn new_client_rejects_unusable_proxy() {
    let config = WebexConfig::new("t", "d")
        .expect("config should build")
        .with_proxy(Some(String::from("::not a url::")));
    let result = WebexClient::new(config);
    assert!(matches!(
        result,
        Err(NotifyError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "proxy"
    ));
}

#[rstest]
#[case(None)]
#[case(Some(""))]
fn send_requires_message_or_attachment(client: WebexClient, #[case] message: Option<&str>) {
    let result = client.send(message, Vec::new());
    assert!(matches!(
        result,
        Err(NotifyError::Input(InputError::NothingToSend))
    ));
}

#[rstest]
fn send_rejects_empty_attachment_before_posting(client: WebexClient) {
    let sources = vec![
        AttachmentSource::from(attachment("full.txt")),
        AttachmentSource::from(Attachment::from_bytes("empty.txt", Vec::new(), None)),
    ];
    let result = client.send(Some("hi"), sources);
    let Err(NotifyError::Input(InputError::EmptyAttachment { filename })) = result else {
        panic!("expected an empty-attachment error");
    };
    assert_eq!(filename, "empty.txt");
}

#[rstest]
fn send_rejects_unsupported_scheme_before_posting(client: WebexClient) {
    let sources = vec![AttachmentSource::classify("ftp://example.com/a.png")];
    let result = client.send(None, sources);
    assert!(matches!(
        result,
        Err(NotifyError::Input(InputError::UnsupportedScheme { ref scheme, .. })) if scheme == "ftp"
    ));
}
