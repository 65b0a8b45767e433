use prometheus::{
    register_histogram, register_int_counter, register_int_gauge_vec, Histogram, IntCounter,
    IntGaugeVec,
};

lazy_static::lazy_static! {
    pub static ref QUERIES_TOTAL: IntCounter = register_int_counter!(
        "haarindex_queries_total", "Total similarity queries"
    ).unwrap();
    pub static ref QUERY_DURATION: Histogram = register_histogram!(
        "haarindex_query_duration_seconds", "Similarity query duration",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).unwrap();
    pub static ref IMAGES_ADDED_TOTAL: IntCounter = register_int_counter!(
        "haarindex_images_added_total", "Images added to the index"
    ).unwrap();
    pub static ref IMAGES_REMOVED_TOTAL: IntCounter = register_int_counter!(
        "haarindex_images_removed_total", "Images removed from the index"
    ).unwrap();
    pub static ref REMOVE_MISSES_TOTAL: IntCounter = register_int_counter!(
        "haarindex_remove_misses_total", "Removes of posts that were not stored"
    ).unwrap();
    pub static ref LIVE_IMAGES: IntGaugeVec = register_int_gauge_vec!(
        "haarindex_live_images", "Live images held in memory", &["index"]
    ).unwrap();
    pub static ref REBUILDS_TOTAL: IntCounter = register_int_counter!(
        "haarindex_rebuilds_total", "Full index rebuilds from the durable store"
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&QUERIES_TOTAL);
    lazy_static::initialize(&QUERY_DURATION);
    lazy_static::initialize(&IMAGES_ADDED_TOTAL);
    lazy_static::initialize(&IMAGES_REMOVED_TOTAL);
    lazy_static::initialize(&REMOVE_MISSES_TOTAL);
    lazy_static::initialize(&LIVE_IMAGES);
    lazy_static::initialize(&REBUILDS_TOTAL);
}
