//! Framework de testes do kernel
//!
//! Suítes rodadas em tempo de boot (feature `self_test`), sem depender do
//! harness do `std`.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

/// Contagem de uma suíte executada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> SuiteReport {
    crate::klog!("=== Executando suite: ");
    crate::klog!(name);
    crate::knl!();

    let mut report = SuiteReport::default();

    for test in tests {
        match (test.func)() {
            TestResult::Passed => {
                crate::klog!("  [PASS] ");
                report.passed += 1;
            }
            TestResult::Failed => {
                crate::klog!("  [FAIL] ");
                report.failed += 1;
            }
            TestResult::Skipped => {
                crate::klog!("  [SKIP] ");
                report.skipped += 1;
            }
        }
        crate::klog!(test.name);
        crate::knl!();
    }

    if report.failed == 0 {
        crate::kok!(name);
    } else {
        crate::kfail!(name);
    }
    crate::kinfo!("Resultados: passed=", report.passed);
    report
}

/// Falha o caso de teste atual se a condição for falsa.
#[macro_export]
macro_rules! ktest_assert {
    ($cond:expr) => {
        if !$cond {
            $crate::kerror!(concat!("(Test) falhou: ", stringify!($cond)));
            return $crate::klib::test_framework::TestResult::Failed;
        }
    };
}
