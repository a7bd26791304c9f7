//! Verify `build_request` / `parse_response` against JSON test vectors stored
//! in `test-vectors/`.
//!
//! Each build vector describes a client configuration, call inputs and the
//! expected request. Each parse vector describes a simulated response and the
//! expected decoded outcome. JSON bodies are compared as parsed values to
//! avoid false negatives from field ordering.

use api_core::{
    ApiError, ClientConfig, Headers, HttpMethod, HttpResponse, RequestClient, ResponseValue, TlsMode,
};
use serde_json::Value;

fn client_from(config: &Value) -> RequestClient {
    let mut builder = ClientConfig::builder(config["base_url"].as_str().unwrap());
    if let Some(token) = config.get("token") {
        builder = builder.token(token[0].as_str().unwrap(), token[1].as_str().unwrap());
    }
    if let Some(creds) = config.get("credentials") {
        builder = builder.credentials(creds[0].as_str().unwrap(), creds[1].as_str().unwrap());
    }
    if let Some(accept) = config.get("accept_invalid_certs") {
        builder = builder.accept_invalid_certs(accept.as_bool().unwrap());
    }
    if let Some(detect) = config.get("detect_error_field") {
        builder = builder.detect_error_field(detect.as_bool().unwrap());
    }
    RequestClient::with_config(builder.build())
}

fn parse_tls(s: &str) -> TlsMode {
    match s {
        "verify" => TlsMode::Verify,
        "disabled" => TlsMode::Disabled,
        other => panic!("unknown tls mode: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let client = client_from(&case["config"]);
        let input = &case["input"];
        let expected = &case["expected_request"];

        let method: HttpMethod = serde_json::from_value(input["method"].clone()).unwrap();
        let headers: Headers = serde_json::from_value(input["headers"].clone()).unwrap();
        let req = client
            .build_request(input["endpoint"].as_str().unwrap(), method, &input["data"], &headers)
            .unwrap();

        let expected_method: HttpMethod = serde_json::from_value(expected["method"].clone()).unwrap();
        assert_eq!(req.method, expected_method, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> =
            serde_json::from_value(expected["headers"].clone()).unwrap();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match &expected["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: body should be None"),
            body => {
                let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&req_body, body, "{name}: body");
            }
        }

        let userpwd = req.credentials.as_ref().map(|c| c.userpwd());
        assert_eq!(userpwd.as_deref(), expected["userpwd"].as_str(), "{name}: userpwd");
        assert_eq!(req.tls, parse_tls(expected["tls"].as_str().unwrap()), "{name}: tls");
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[test]
fn parse_test_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut client = RequestClient::new("https://example.test");
        client.set_detect_error_field(case["detect_error_field"].as_bool().unwrap_or(false));

        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = client.parse_response(response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Application" => {
                    assert!(matches!(err, ApiError::Application(_)), "{name}: expected Application")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else if case["expected_empty"].as_bool().unwrap_or(false) {
            assert_eq!(result.unwrap(), ResponseValue::Empty, "{name}: expected Empty");
        } else {
            assert_eq!(
                result.unwrap(),
                ResponseValue::Json(case["expected_result"].clone()),
                "{name}: parsed result"
            );
        }
    }
}
