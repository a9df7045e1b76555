// src/utils/constants.rs

// ---------------------------------------------------------
// Redis Keys
// ---------------------------------------------------------
// Every key of one queue carries the `{base}` hash tag so the scripts
// stay on a single cluster slot.
//   {base}:<level>          LIST   level records
//   {base}:count:<level>    STRING level arrival counter
//   {base}:count_map        HASH   id -> seq (existence map)
//   {base}:level_map        HASH   id -> level
pub const SUFFIX_COUNT: &str = "count";
pub const SUFFIX_COUNT_MAP: &str = "count_map";
pub const SUFFIX_LEVEL_MAP: &str = "level_map";

// Largest integer the Lua number type represents exactly.
pub const MAX_SEQUENCE: i64 = (1 << 53) - 1;

// ---------------------------------------------------------
// Defaults
// ---------------------------------------------------------
pub const DEFAULT_BASE_KEY: &str = "levelq";
pub const DEFAULT_MAX_LEVEL: i64 = 3;
pub const DEFAULT_REGULAR_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_THRESHOLD_COUNT: u64 = 100;
