use super::GLOBAL_LABELS;

pub(crate) const TG_UPDATES_TOTAL: &str = "memes_tg_updates_total";
pub(crate) const TG_UPDATES_SKIPPED_TOTAL: &str = "memes_tg_updates_skipped_total";
pub(crate) const TREASURY_PAYMENTS_TOTAL: &str = "memes_tg_treasury_payments_total";
pub(crate) const REWARD_CYCLES_TOTAL: &str = "memes_tg_reward_cycles_total";
pub(crate) const DEEP_LINKS_TOTAL: &str = "memes_tg_deep_links_total";

pub fn init_metrics() {
    let mut builder = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], 2000));

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .expect("BUG: failed to initialize the metrics listener");

    describe();
}

fn describe() {
    metrics::describe_counter!(
        TG_UPDATES_TOTAL,
        "Number of updates received from Telegram"
    );
    metrics::describe_counter!(
        TG_UPDATES_SKIPPED_TOTAL,
        "Number of updates received from Telegram, that were skipped by the bot"
    );
    metrics::describe_counter!(
        TREASURY_PAYMENTS_TOTAL,
        "Number of payment attempts by transaction type and outcome"
    );
    metrics::describe_counter!(
        REWARD_CYCLES_TOTAL,
        "Number of weekly reward cycles by outcome"
    );
    metrics::describe_counter!(
        DEEP_LINKS_TOTAL,
        "Number of `/start` deep links processed by attribution outcome"
    );
}
