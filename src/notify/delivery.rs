// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push delivery transport.

use std::future::Future;

use crate::error::DeliveryError;

use super::{Notification, Subscriber};

/// Sends one notification to one subscriber.
///
/// Implementations must report a permanently invalid endpoint as
/// [`DeliveryError::Gone`] so the fanout can prune it.
pub trait PushDelivery {
    /// Delivers `notification` to `subscriber`.
    fn deliver(
        &self,
        subscriber: &Subscriber,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::{Client, StatusCode};

    use super::{DeliveryError, Notification, PushDelivery, Subscriber};

    /// Delivers notifications by POSTing the JSON payload to the endpoint.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use printwatch::notify::{HttpPushDelivery, Notification, PushDelivery, Subscriber};
    ///
    /// # async fn example() -> Result<(), printwatch::error::DeliveryError> {
    /// let delivery = HttpPushDelivery::new()?;
    /// let sub = Subscriber::new("https://push.example.com/abc");
    /// delivery.deliver(&sub, &Notification::new("Hi", "There", "/")).await?;
    /// # Ok(())
    /// # }
    /// ```
    #[derive(Debug, Clone)]
    pub struct HttpPushDelivery {
        client: Client,
        ttl: Duration,
    }

    impl HttpPushDelivery {
        /// Default request timeout.
        pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
        /// Default time the push service keeps an undelivered message.
        pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

        /// Creates a delivery with the default timeout.
        ///
        /// # Errors
        ///
        /// Returns `DeliveryError::Transport` if the HTTP client cannot be built.
        pub fn new() -> Result<Self, DeliveryError> {
            Self::with_timeout(Self::DEFAULT_TIMEOUT)
        }

        /// Creates a delivery with a custom request timeout.
        ///
        /// # Errors
        ///
        /// Returns `DeliveryError::Transport` if the HTTP client cannot be built.
        pub fn with_timeout(timeout: Duration) -> Result<Self, DeliveryError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;
            Ok(Self::from_client(client))
        }

        /// Wraps an existing client.
        #[must_use]
        pub fn from_client(client: Client) -> Self {
            Self {
                client,
                ttl: Self::DEFAULT_TTL,
            }
        }

        /// Sets the `TTL` header value.
        #[must_use]
        pub fn with_ttl(mut self, ttl: Duration) -> Self {
            self.ttl = ttl;
            self
        }
    }

    impl PushDelivery for HttpPushDelivery {
        async fn deliver(
            &self,
            subscriber: &Subscriber,
            notification: &Notification,
        ) -> Result<(), DeliveryError> {
            let response = self
                .client
                .post(subscriber.endpoint.as_str())
                .header("TTL", self.ttl.as_secs().to_string())
                .json(notification)
                .send()
                .await
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;

            classify(response.status())
        }
    }

    fn classify(status: StatusCode) -> Result<(), DeliveryError> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(DeliveryError::Gone(status.as_u16())),
            s => Err(DeliveryError::Rejected(s.as_u16())),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn status_classification() {
            assert!(classify(StatusCode::CREATED).is_ok());
            assert!(matches!(
                classify(StatusCode::GONE),
                Err(DeliveryError::Gone(410))
            ));
            assert!(matches!(
                classify(StatusCode::NOT_FOUND),
                Err(DeliveryError::Gone(404))
            ));
            assert!(matches!(
                classify(StatusCode::TOO_MANY_REQUESTS),
                Err(DeliveryError::Rejected(429))
            ));
        }
    }
}

#[cfg(feature = "http")]
pub use http::HttpPushDelivery;
