//! This example scans a raw physical memory dump for page-table roots, then
//! for the VMCS of hypervisors running them.
//!
//! Usage: `scan-dump <dump> [exit-after]`

use vtero::{PtType, Scanner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: scan-dump <dump> [exit-after]")?;
    let exit_after = match args.next() {
        Some(value) => value.parse()?,
        None => 0,
    };

    // First pass: every operating system family.
    let mut scanner = Scanner::new(&path).with_scan_mode(PtType::ALL_OS | PtType::GENERIC);
    let found = scanner.analyze(exit_after)?;
    tracing::info!(found, "page table roots");

    let processes = scanner.processes().snapshot();
    for process in &processes {
        println!("{process}");
    }

    if processes.is_empty() {
        return Ok(());
    }

    // Second pass: VMCS anchored on the roots found above.
    scanner.set_vmcs_candidates(processes);
    scanner.set_scan_mode(PtType::VMCS);
    scanner.analyze(0)?;

    for vmcs in scanner.vmcs().snapshot() {
        println!("{vmcs}");
    }

    Ok(())
}
