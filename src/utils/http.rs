use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

use crate::config::CONFIG;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    let mut builder = Client::builder().user_agent(concat!("cp_generator/", env!("CARGO_PKG_VERSION")));
    if CONFIG.http_timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(CONFIG.http_timeout_seconds));
    }
    builder.build().unwrap_or_else(|err| {
        warn!("Failed to build configured HTTP client, using defaults: {err}");
        Client::new()
    })
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
