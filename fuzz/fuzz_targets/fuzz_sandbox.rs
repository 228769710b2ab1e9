#![no_main]

use bandcode::band::{check_invariants, Roster};
use bandcode::{Execution, RunBudget, Sandbox};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(store) = Roster::standard(8).to_store() else {
        return;
    };

    // Small budgets keep each input fast; the watchdog still has to fire.
    let mut sandbox = Sandbox::new(RunBudget {
        max_operations: 20_000,
        max_duration_ms: 250,
    });

    match sandbox.execute(source, &store) {
        Execution::Completed { store, .. } => {
            assert!(check_invariants(&store).is_empty());
        }
        Execution::Failed { diagnostic, .. } => {
            assert!(!diagnostic.message.is_empty());
        }
    }
});
