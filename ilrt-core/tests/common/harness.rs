//! Lightweight named-case runner for integration scenarios
//!
//! Collects pass/fail per case instead of stopping at the first failure, so
//! one run reports every broken scenario.

use std::time::Instant;

/// Outcome of one case
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub duration_us: u128,
    pub error_message: Option<String>,
}

/// Runs named cases and keeps their results
#[derive(Debug, Default)]
pub struct TestHarness {
    results: Vec<TestResult>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a single case
    pub fn run_test<F>(&mut self, name: &str, test_fn: F)
    where
        F: FnOnce() -> Result<(), String>,
    {
        let started = Instant::now();
        let result = test_fn();
        self.results.push(TestResult {
            name: name.to_string(),
            passed: result.is_ok(),
            duration_us: started.elapsed().as_micros(),
            error_message: result.err(),
        });
    }

    /// Run the same case once per parameter
    pub fn run_parameterized_test<T, F>(&mut self, name: &str, params: &[T], test_fn: F)
    where
        T: std::fmt::Debug,
        F: Fn(&T) -> Result<(), String>,
    {
        for param in params {
            self.run_test(&format!("{}[{:?}]", name, param), || test_fn(param));
        }
    }

    pub fn print_summary(&self) {
        let total = self.results.len();
        let passed = self.results.iter().filter(|r| r.passed).count();

        println!("\nTest Results:");
        println!("============");
        println!("Total:  {}", total);
        println!("Passed: {}", passed);
        println!("Failed: {}", total - passed);

        for result in self.results.iter().filter(|r| !r.passed) {
            println!("  FAILED {}", result.name);
            if let Some(msg) = &result.error_message {
                println!("    Error: {}", msg);
            }
        }

        let slowest = self.results.iter().map(|r| r.duration_us).max().unwrap_or(0);
        println!("Slowest case: {} µs", slowest);
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}
