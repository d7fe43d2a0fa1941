mod sync_tests;
mod utils;
