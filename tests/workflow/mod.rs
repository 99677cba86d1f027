mod compensation_test;
mod concurrency_test;
mod create_test;
mod normalization_test;
mod session_test;
