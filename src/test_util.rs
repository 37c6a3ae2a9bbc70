use aws_sdk_s3::Credentials;
use aws_smithy_client::test_connection::TestConnection;
use aws_smithy_http::body::SdkBody;
use aws_types::{region::Region, SdkConfig};

/// Configuration for mocking AWS SDK clients
pub async fn get_mock_config() -> SdkConfig {
    aws_config::from_env()
        .region(Region::new("us-west-1"))
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .load()
        .await
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str) -> http::request::Builder {
    http::Request::builder().uri(format!("https://{service}.us-west-1.amazonaws.com/"))
}

/// Connection answering every request with the same canned response.
/// The expected requests are placeholders, tests inspect the actual ones.
pub fn canned_connection(
    requests: usize,
    status: u16,
    body: &'static str,
) -> TestConnection<SdkBody> {
    let events = (0..requests)
        .map(|_| {
            (
                http::Request::builder()
                    .uri("https://placeholder/")
                    .body(SdkBody::from(""))
                    .unwrap(),
                http::Response::builder()
                    .status(status)
                    .body(SdkBody::from(body))
                    .unwrap(),
            )
        })
        .collect();
    TestConnection::new(events)
}

/// Body of a captured request, as text.
pub fn body_text(request: &http::Request<SdkBody>) -> String {
    String::from_utf8_lossy(request.body().bytes().unwrap_or_default()).into_owned()
}
