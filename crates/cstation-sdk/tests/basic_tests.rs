//! Offline tests for the public types, errors and decoder.

use cstation_sdk::*;
use serde_json::json;

#[test]
fn test_client_creation() {
    let client = ContainerStationClient::new("https://nas.local:8443/").unwrap();
    assert_eq!(client.base_url(), "https://nas.local:8443");
    assert_eq!(API_PREFIX, "/containerstation/api/v1");
}

#[test]
fn test_client_from_config() {
    let config = ClientConfig::new("http://192.168.1.20:8080").with_accept_invalid_certs(true);
    let client = ContainerStationClient::from_config(config).unwrap();
    assert_eq!(client.base_url(), "http://192.168.1.20:8080");
}

#[test]
fn test_enum_wire_strings() {
    assert_eq!(ContainerType::Docker.to_string(), "docker");
    assert_eq!(ContainerType::Lxc.to_string(), "lxc");
    assert_eq!(Protocol::Udp.to_string(), "udp");
    assert_eq!(ContainerAction::Restart.to_string(), "restart");

    assert_eq!(serde_json::to_value(ContainerType::Lxc).unwrap(), json!("lxc"));
    assert_eq!(
        serde_json::from_value::<ContainerType>(json!("docker")).unwrap(),
        ContainerType::Docker
    );
}

#[test]
fn test_validation_error_display() {
    let err = "zone".parse::<ContainerType>().unwrap_err();
    assert!(err.to_string().contains("invalid parameter"));
    assert!(err.to_string().contains("zone"));
}

#[test]
fn test_decoder_error_shape() {
    let body = br#"{"error":{"code":404,"message":"no such container"}}"#;
    let decoded = decode_body::<Container>(body).unwrap();

    assert!(has_error_marker(body));
    assert_eq!(
        decoded,
        Decoded::Failure(ApiError {
            code: Some(404),
            message: Some("no such container".to_string()),
        })
    );
}

#[test]
fn test_decoder_success_shape() {
    let body = json!({"used": true}).to_string();
    let decoded = decode_body::<PortUsage>(body.as_bytes()).unwrap();
    assert_eq!(decoded, Decoded::Success(PortUsage { used: true }));
    assert!(decoded.into_result().unwrap().used);
}

#[test]
fn test_api_error_into_sdk_error() {
    let err: SdkError = Decoded::<LogoutResponse>::Failure(ApiError {
        code: Some(500),
        message: Some("internal".to_string()),
    })
    .into_result()
    .unwrap_err();

    assert_eq!(err.api_code(), Some(500));
    assert_eq!(err.to_string(), "Container Station error (500): internal");
}
