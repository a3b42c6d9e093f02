use aws_sdk_s3::Client;

/// Build an S3 client from the default credential chain.
///
/// `region` overrides whatever the environment resolves.
pub async fn build_client(region: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    let config = loader.load().await;
    Client::new(&config)
}
