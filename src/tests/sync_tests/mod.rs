mod export_tests;
mod import_tests;
mod lock_tests;
mod reconcile_tests;
mod run_tests;
mod search_tests;
