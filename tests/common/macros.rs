/// Asserts a derived stat is within `tolerance` of the expected value.
#[macro_export]
macro_rules! assert_stat_near {
    ($actual:expr, $expected:expr) => {
        $crate::assert_stat_near!($actual, $expected, 1e-6)
    };
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        assert!(
            (actual - expected).abs() <= $tolerance,
            "stat {} is not within {} of {}",
            actual,
            $tolerance,
            expected
        );
    };
}

/// Asserts an API call failed with `status` and an `{"error": ...}` body.
#[macro_export]
macro_rules! assert_api_error {
    ($response:expr, $status:expr) => {
        let (status, body) = $response;
        assert_eq!(status, $status, "unexpected status, body: {}", body);
        assert!(
            body["error"].is_string(),
            "error body missing message: {}",
            body
        );
    };
}
