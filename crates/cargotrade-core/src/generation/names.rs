//! Name generation for trade maps

use rand::Rng;

/// `"<prefix> NNN"` with a zero-padded number below 1000, so two trade posts
/// in the same session are unlikely to share a name
pub fn trade_station_name(prefix: &str, rng: &mut impl Rng) -> String {
    format!("{} {:03}", prefix, rng.gen_range(0..1000))
}
