#![allow(dead_code, unused_imports)]

pub use keysweep_test_utils::builders;
pub use keysweep_test_utils::fake_scanner::FakeScanner;
pub use keysweep_test_utils::{init_tracing, with_timeout};
