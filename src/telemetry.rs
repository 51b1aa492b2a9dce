//! Error reporting to Sentry.

use crate::config::Config;

/// Starts the Sentry client when `SENTRY_DSN` is configured.
///
/// The returned guard flushes pending events on drop, so `main` keeps it alive
/// for the lifetime of the server. Without a DSN nothing is initialised and
/// `sentry::capture_*` calls become no-ops.
pub fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let raw = config.sentry_dsn.as_deref()?;
    let dsn = match raw.parse::<sentry::types::Dsn>() {
        Ok(dsn) => dsn,
        Err(err) => {
            log::warn!("Ignoring invalid SENTRY_DSN: {}", err);
            return None;
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        environment: Some(config.profile.as_str().into()),
        attach_stacktrace: true,
        ..Default::default()
    });

    log::info!("Sentry reporting enabled for {}", config.profile);
    Some(guard)
}
