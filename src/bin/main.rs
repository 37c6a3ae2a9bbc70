use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use webhook_ingest::{handle_event, Config, IncomingEvent, WebhookProcessor};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    // Get AWS Configuration
    let sdk_config = aws_config::load_from_env().await;

    let config = Config::from_env();
    tracing::info!(
        source = %config.source,
        bucket = %config.raw_bucket,
        environment = %config.environment,
        "starting webhook ingest"
    );
    let processor = WebhookProcessor::new(&sdk_config, &config);

    run(service_fn(|event: LambdaEvent<IncomingEvent>| {
        handle_event(&processor, event)
    }))
    .await
}
