//! The `mandrill` mail driver.

use crate::config::MandrillConfig;
use crate::error::Error as ApiError;
use crate::payload::{Delivery, SendRequest, parse_response};
use mailgate_core::{
    Driver, DriverConfig, Error, Message, Result, SendContext, SendResult, async_trait,
};
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Name the Mandrill driver registers under.
pub const DRIVER_NAME: &str = "mandrill";

const SEND_PATH: &str = "/messages/send.json";

/// Driver that posts messages to a Mandrill-compatible HTTP API.
///
/// One HTTP client, with its connection pool, is shared by all sends.
#[derive(Debug, Clone)]
pub struct MandrillDriver {
    config: MandrillConfig,
    client: Client,
}

impl MandrillDriver {
    /// Creates a driver from typed settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] if the settings are invalid, or
    /// [`Error::ConnectionFailed`] if the HTTP client cannot be built.
    pub fn new(config: MandrillConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::connection_failed("failed to build HTTP client").with_source(e))?;
        Ok(Self { config, client })
    }

    /// Creates a driver from an untyped driver configuration.
    ///
    /// # Errors
    ///
    /// See [`MandrillDriver::new`].
    pub fn from_config(raw: &DriverConfig) -> Result<Self> {
        Self::new(MandrillConfig::from_driver_config(raw))
    }

    /// Returns the driver settings.
    #[must_use]
    pub const fn config(&self) -> &MandrillConfig {
        &self.config
    }

    async fn post(
        &self,
        url: Url,
        request: &SendRequest<'_>,
    ) -> std::result::Result<Delivery, ApiError> {
        debug!(%url, recipients = request.message.to.len(), "posting message to Mandrill");

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "Mandrill responded");

        parse_response(status, &body)
    }
}

#[async_trait]
impl Driver for MandrillDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    async fn send(&self, ctx: &SendContext, message: &Message) -> Result<SendResult> {
        message.validate()?;

        let url = self.config.endpoint(SEND_PATH)?;
        let request = SendRequest::new(&self.config.api_key, message);
        let delivery = ctx
            .run(async { self.post(url, &request).await.map_err(Error::from) })
            .await?;

        match delivery {
            Delivery::Accepted(result) => {
                debug!(message_id = %result.message_id, status = %result.status, "message accepted by Mandrill");
                Ok(result)
            }
            Delivery::Rejected(result, reason) => {
                Err(Error::send_failed(format!("message rejected: {reason}")).with_result(result))
            }
        }
    }
}

/// Builds a [`MandrillDriver`] from a driver configuration, for registries.
///
/// # Errors
///
/// See [`MandrillDriver::from_config`].
pub fn factory(raw: &DriverConfig) -> Result<Arc<dyn Driver>> {
    Ok(Arc::new(MandrillDriver::from_config(raw)?))
}
