use crate::envelope::Source;

const DEFAULT_RAW_BUCKET: &str = "edna-stream-meraki";
const DEFAULT_ENVIRONMENT: &str = "production";

/// `Config` holds the settings read from the function environment
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Bucket receiving raw archives and COPY job files (`RAW_BUCKET`)
    pub raw_bucket: String,
    /// SNS topic for alerts (`ALERT_SNS_TOPIC`), alerts are only logged when unset
    pub alert_topic_arn: Option<String>,
    /// Firehose stream receiving envelopes (`FIREHOSE_STREAM`)
    pub firehose_stream: Option<String>,
    /// Integration this function receives webhooks from (`WEBHOOK_SOURCE`)
    pub source: Source,
    /// Environment tag stored in every envelope (`ENVIRONMENT`)
    pub environment: String,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Config {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from any key lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            raw_bucket: get("RAW_BUCKET").unwrap_or_else(|| DEFAULT_RAW_BUCKET.to_string()),
            alert_topic_arn: get("ALERT_SNS_TOPIC"),
            firehose_stream: get("FIREHOSE_STREAM"),
            source: get("WEBHOOK_SOURCE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(Source::Meraki),
            environment: get("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!("edna-stream-meraki", config.raw_bucket);
        assert_eq!(None, config.alert_topic_arn);
        assert_eq!(None, config.firehose_stream);
        assert_eq!(Source::Meraki, config.source);
        assert_eq!("production", config.environment);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("RAW_BUCKET", "edna-stream-greenhouse"),
            ("ALERT_SNS_TOPIC", "arn:aws:sns:us-west-1:123456789012:alerts"),
            ("FIREHOSE_STREAM", ""),
            ("WEBHOOK_SOURCE", "greenhouse_webhook"),
            ("ENVIRONMENT", "staging"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!("edna-stream-greenhouse", config.raw_bucket);
        assert_eq!(
            Some("arn:aws:sns:us-west-1:123456789012:alerts".to_string()),
            config.alert_topic_arn
        );
        assert_eq!(None, config.firehose_stream);
        assert_eq!(Source::Greenhouse, config.source);
        assert_eq!("staging", config.environment);
    }
}
