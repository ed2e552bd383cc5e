use deepwork_core::sweeper;

use crate::common::open_engine;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let report = sweeper::sweep_once(&engine).await;

    for (id, status) in &report.transitions {
        println!("{id} -> {status}");
    }
    if report.transitions.is_empty() {
        println!("nothing to sweep");
    }
    if report.failures > 0 {
        eprintln!("warning: {} session(s) failed to sweep", report.failures);
    }
    Ok(())
}
