//! Managed table store module
//!
//! Handles:
//! - DynamoDB record access (scan/get/put)
//! - AttributeValue conversion between the SDK and `data::Record`

mod dynamo;

pub use dynamo::DynamoStore;

pub(crate) fn build_http_client() -> aws_sdk_dynamodb::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    // Plain http stays allowed for DynamoDB Local endpoints.
    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
