use leptos::prelude::*;
use twt_composer::app::Composer;
use twt_composer::config::ComposerConfig;
use twt_composer::logging;

fn main() {
    console_error_panic_hook::set_once();
    let (config, config_error) = ComposerConfig::load();
    logging::init(&config.log_filter);
    if let Some(err) = config_error {
        tracing::warn!(%err, "ignoring composer config");
    }
    tracing::info!(lookup = %config.lookup_url, "composer starting");
    mount_to_body(move || view! { <Composer config=config /> })
}
