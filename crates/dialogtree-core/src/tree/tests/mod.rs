mod property_stats_tests;
mod snapshot_tests;
mod support;
mod tree_tests;
