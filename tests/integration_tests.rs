// Integration tests entry point
// Run with: cargo test --test integration_tests

mod integration {
    mod batch_test;
    mod font_test;
    mod watermark_test;
    pub mod test_harness;
}
