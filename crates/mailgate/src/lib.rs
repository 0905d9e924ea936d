//! # mailgate
//!
//! Provider-agnostic email dispatch.
//!
//! Compose a [`Message`] once and send it through any configured transport.
//! Drivers are looked up by name in a [`Registry`], built lazily by a
//! [`Manager`] from a declarative [`MailConfig`], and shared by every caller
//! afterwards.
//!
//! Built-in drivers (each behind a cargo feature of the same name):
//!
//! - `smtp`: a hand-rolled SMTP session with MIME rendering ([`smtp`])
//! - `mandrill`: the Mandrill transactional HTTP API ([`mandrill`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailgate::{DriverConfig, MailConfig, Manager, SendContext};
//! use std::time::Duration;
//!
//! # async fn run() -> mailgate::Result<()> {
//! let config = MailConfig::new("smtp")
//!     .default_from("noreply@example.com", "Example")
//!     .driver(
//!         "smtp",
//!         DriverConfig::new()
//!             .set("host", "smtp.example.com")
//!             .set("port", 587)
//!             .set("security", "starttls")
//!             .set("username", "user")
//!             .set("password", "secret"),
//!     );
//!
//! let manager = Manager::new(config, mailgate::bootstrap())?;
//! let result = manager
//!     .builder()
//!     .to(["user@example.com"])
//!     .subject("Welcome")
//!     .text("Hello!")
//!     .send(&SendContext::with_timeout(Duration::from_secs(10)))
//!     .await?;
//! println!("sent as {}", result.message_id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::sync::{Arc, Once};
use tracing::debug;

pub use mailgate_core::{
    Attachment, Builder, CancellationToken, DEFAULT_ATTACHMENT_TYPE, Driver, DriverConfig,
    DriverFactory, Error, ErrorKind, MailConfig, Manager, Message, Registry, Result, SendContext,
    SendResult, async_trait, config, default_registry,
};

#[cfg(feature = "testing")]
pub use mailgate_core::testing;

/// The SMTP transport.
#[cfg(feature = "smtp")]
pub mod smtp {
    pub use mailgate_smtp::{
        DEFAULT_PORT, DEFAULT_TIMEOUT, DRIVER_NAME, Security, SmtpConfig, SmtpDriver, factory,
    };

    /// MIME document assembly used by the SMTP transport.
    pub use mailgate_mime as mime;
}

/// The Mandrill HTTP transport.
#[cfg(feature = "mandrill")]
pub mod mandrill {
    pub use mailgate_mandrill::{
        DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DRIVER_NAME, MandrillConfig, MandrillDriver, factory,
    };
}

/// Registers every driver compiled into this build with `registry`.
///
/// Existing registrations under the same names are replaced.
pub fn register_builtin_drivers(registry: &Registry) {
    #[cfg(feature = "smtp")]
    registry.register(smtp::DRIVER_NAME, smtp::factory);
    #[cfg(feature = "mandrill")]
    registry.register(mandrill::DRIVER_NAME, mandrill::factory);
    debug!(drivers = ?registry.names(), "registered built-in mail drivers");
}

/// Returns the process-wide [`default_registry`] with the built-in drivers
/// registered.
///
/// Registration happens once per process; drivers added to the default
/// registry later are kept.
#[must_use]
pub fn bootstrap() -> Arc<Registry> {
    static REGISTER: Once = Once::new();
    let registry = default_registry();
    REGISTER.call_once(|| register_builtin_drivers(&registry));
    registry
}

#[cfg(all(test, feature = "smtp", feature = "mandrill"))]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtin_drivers() {
        let registry = Registry::new();
        register_builtin_drivers(&registry);
        assert!(registry.has("smtp"));
        assert!(registry.has("mandrill"));
    }

    #[test]
    fn test_bootstrap_is_shared_and_idempotent() {
        let first = bootstrap();
        first.register("custom", smtp::factory);
        let second = bootstrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.has("custom"));
        assert!(second.has("smtp"));
    }

    #[test]
    fn test_builtin_factories_validate() {
        let registry = Registry::new();
        register_builtin_drivers(&registry);

        let err = registry.create("smtp", &DriverConfig::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverConfig);
        let err = registry.create("mandrill", &DriverConfig::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverConfig);

        let driver = registry
            .create("mandrill", &DriverConfig::new().set("api_key", "k"))
            .unwrap();
        assert_eq!(driver.name(), "mandrill");
    }
}
