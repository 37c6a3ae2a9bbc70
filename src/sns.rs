use crate::{error::RuntimeError, normalize::Notice};
use aws_sdk_sns::{Client, Error};

/// `Notifier` delivers notices to the alerting channel.
///
/// Every notice is logged. When a topic is configured it's also
/// published to SNS; publish failures are logged and swallowed.
pub struct Notifier {
    topic: Option<Topic>,
}

struct Topic {
    inner: Client,
    arn: String,
}

impl Notifier {
    /// Initialize the notifier, publishing to `topic_arn` when present.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &aws_types::SdkConfig, topic_arn: Option<&str>) -> Notifier {
        let topic = topic_arn.map(|arn| {
            tracing::info!("Initializing SNS client");
            Topic {
                inner: Client::new(config),
                arn: arn.into(),
            }
        });
        Notifier { topic }
    }

    /// Notifier publishing through an existing client.
    pub fn from_client(inner: Client, topic_arn: &str) -> Notifier {
        Notifier {
            topic: Some(Topic {
                inner,
                arn: topic_arn.into(),
            }),
        }
    }

    /// Notifier that only writes notices to the logs.
    pub fn log_only() -> Notifier {
        Notifier { topic: None }
    }

    /// Log and publish every notice.
    pub async fn deliver(&self, notices: &[Notice]) {
        for notice in notices {
            tracing::warn!(subject = %notice.subject(), "{}", notice.message());
            if let Err(err) = self.publish(notice).await {
                tracing::error!(error = %err, "failed to send SNS alert");
            }
        }
    }

    /// Publish a notice to the topic, if one is configured.
    #[tracing::instrument(skip(self, notice))]
    pub async fn publish(&self, notice: &Notice) -> Result<(), RuntimeError> {
        let topic = match &self.topic {
            Some(topic) => topic,
            None => return Ok(()),
        };

        topic
            .inner
            .publish()
            .topic_arn(&topic.arn)
            .subject(notice.subject())
            .message(notice.message())
            .send()
            .await
            .map_err(Error::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use aws_sdk_sns::{Client, Config};
    use aws_smithy_client::erase::DynConnector;

    const PUBLISH_RESPONSE: &str = r#"<PublishResponse xmlns="http://sns.amazonaws.com/doc/2010-03-31/">
  <PublishResult>
    <MessageId>94f20ce6-13c5-43a0-9a9e-ca52d816e90b</MessageId>
  </PublishResult>
  <ResponseMetadata>
    <RequestId>f187a3c1-376f-11df-8963-01868b7c937a</RequestId>
  </ResponseMetadata>
</PublishResponse>"#;

    fn unknown_schema() -> Notice {
        Notice::UnknownSchema {
            payload: "{\n  \"action\": \"ping\"\n}".into(),
        }
    }

    #[tokio::test]
    async fn test_publish_notice() -> Result<(), RuntimeError> {
        let conn = canned_connection(1, 200, PUBLISH_RESPONSE);
        let config = Config::new(&get_mock_config().await);
        let inner = Client::from_conf_conn(config, DynConnector::new(conn.clone()));
        let notifier = Notifier::from_client(inner, "arn:aws:sns:us-west-1:123456789012:alerts");

        notifier.publish(&unknown_schema()).await?;

        let requests = conn.requests();
        assert_eq!(1, requests.len());
        let body = body_text(&requests[0].actual);
        assert!(body.contains("Action=Publish"));
        assert!(body.contains("TopicArn=arn%3Aaws%3Asns%3Aus-west-1%3A123456789012%3Aalerts"));

        Ok(())
    }

    #[tokio::test]
    async fn test_deliver_swallows_publish_errors() {
        let conn = canned_connection(
            2,
            400,
            r#"<ErrorResponse><Error><Type>Sender</Type><Code>NotFound</Code><Message>Topic does not exist</Message></Error></ErrorResponse>"#,
        );
        let config = Config::new(&get_mock_config().await);
        let inner = Client::from_conf_conn(config, DynConnector::new(conn.clone()));
        let notifier = Notifier::from_client(inner, "arn:aws:sns:us-west-1:123456789012:missing");

        notifier.deliver(&[unknown_schema(), unknown_schema()]).await;
        assert_eq!(2, conn.requests().len());
    }

    #[tokio::test]
    async fn test_log_only_never_publishes() -> Result<(), RuntimeError> {
        let notifier = Notifier::log_only();
        notifier.publish(&unknown_schema()).await?;
        notifier.deliver(&[unknown_schema()]).await;
        Ok(())
    }
}
