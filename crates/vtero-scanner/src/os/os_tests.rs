use vtero_core::{Block, DetectedProc, Pa, ProcessRegistry, PtType, VmcsRegistry};

use super::{LinuxDetector, freebsd, generic, hyperv, netbsd, openbsd, windows};
use crate::{BlockLocation, ScanContext};

///////////////////////////////////////////////////////////////////////////////
// Test Helpers
///////////////////////////////////////////////////////////////////////////////

const FILE_SIZE: u64 = 0x10_0000;

struct Registries {
    processes: ProcessRegistry,
    vmcs: VmcsRegistry,
}

impl Registries {
    fn new() -> Self {
        Self {
            processes: ProcessRegistry::new(),
            vmcs: VmcsRegistry::new(),
        }
    }

    fn ctx(&self) -> ScanContext<'_> {
        ScanContext::new(FILE_SIZE, &self.processes, &self.vmcs)
    }
}

fn block(words: &[u64]) -> Block<'_> {
    Block::new(words).expect("page sized block")
}

fn windows_page(offset: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0001_2345_6847;
    words[windows::SELF_MAP_SLOT] = offset | 0x63;
    words
}

fn hyperv_page(offset: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0042_1063;
    words[hyperv::SELF_MAP_SLOT] = offset | 0x63;
    words
}

fn freebsd_page(offset: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0010_1067;
    words[0xff] = 0x0000_0000_0010_2067;
    words[freebsd::SELF_MAP_SLOT] = offset | 0x63;
    words
}

fn openbsd_page(offset: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[254] = 0x0000_0000_0020_1063;
    words[256] = 0x0000_0000_0020_2063;
    words[510] = 0x0000_0000_0020_3067;
    words[openbsd::SELF_MAP_SLOT] = offset | 0x63;
    words
}

fn netbsd_page(offset: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[320] = 0x0000_0000_0030_1063;
    words[511] = 0x0000_0000_0030_2063;
    words[openbsd::SELF_MAP_SLOT] = offset | 0x63;
    words
}

fn linux_page(lower: u64) -> Vec<u64> {
    let mut words = vec![0u64; 512];
    words[0] = lower;
    for slot in super::linux::KERNEL_SLOTS {
        words[slot] = 0x0000_0000_0040_0067 + ((slot as u64) << 12);
    }
    words
}

///////////////////////////////////////////////////////////////////////////////
// Windows
///////////////////////////////////////////////////////////////////////////////

#[test]
fn windows_self_map_at_own_offset() {
    let registries = Registries::new();
    let words = windows_page(0x5000);

    assert!(windows::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x5000)
    ));

    let process = registries.processes.get(0x5000).expect("recorded");
    assert_eq!(process.kind, PtType::WINDOWS);
    assert_eq!(process.cr3.0, 0x5000);
    assert_eq!(process.diff, 0);
    assert_eq!(process.mode, 2);
    assert_eq!(process.top_page_table.len(), 2);
    assert_eq!(process.top_page_table.get(0x1ed), Some(0x5063));
}

#[test]
fn windows_diff_is_offset_minus_cr3() {
    let registries = Registries::new();
    let words = windows_page(0x2000);

    assert!(windows::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x7000)
    ));

    let process = registries.processes.get(0x7000).expect("recorded");
    assert_eq!(process.diff, 0x5000);
}

#[test]
fn windows_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = windows_page(0x5000);
    words[windows::SELF_MAP_SLOT] |= 0x400;

    assert!(!windows::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x5000)
    ));
    assert!(registries.processes.is_empty());
}

#[test]
fn windows_rejects_bad_first_entry() {
    let registries = Registries::new();
    let mut words = windows_page(0x5000);
    words[0] = 0x0000_0001_2345_6063;

    assert!(!windows::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x5000)
    ));
}

#[test]
fn duplicate_offset_still_matches() {
    let registries = Registries::new();
    let words = windows_page(0x5000);
    let location = BlockLocation::contiguous(0x5000);

    assert!(windows::detect(&registries.ctx(), block(&words), location));
    assert!(windows::detect(&registries.ctx(), block(&words), location));
    assert_eq!(registries.processes.len(), 1);
}

///////////////////////////////////////////////////////////////////////////////
// Hyper-V
///////////////////////////////////////////////////////////////////////////////

#[test]
fn hyperv_matches() {
    let registries = Registries::new();
    let words = hyperv_page(0x9000);

    assert!(hyperv::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x9000)
    ));

    let process = registries.processes.get(0x9000).expect("recorded");
    assert_eq!(process.kind, PtType::HYPERV);
    assert_eq!(process.diff, 0);
}

#[test]
fn hyperv_requires_empty_last_slot() {
    let registries = Registries::new();
    let mut words = hyperv_page(0x9000);
    words[0x1ff] = 0x0000_0000_0050_0063;

    assert!(!hyperv::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x9000)
    ));
}

#[test]
fn hyperv_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = hyperv_page(0x9000);
    words[hyperv::SELF_MAP_SLOT] |= 0x8000_0000_0000_0000;

    assert!(!hyperv::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x9000)
    ));
}

#[test]
fn hyperv_rejects_zero_self_map_address() {
    let registries = Registries::new();
    let words = hyperv_page(0);

    assert!(!hyperv::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x9000)
    ));
    assert!(registries.processes.is_empty());
}

///////////////////////////////////////////////////////////////////////////////
// FreeBSD
///////////////////////////////////////////////////////////////////////////////

#[test]
fn freebsd_matches() {
    let registries = Registries::new();
    let words = freebsd_page(0x3000);

    assert!(freebsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x3000)
    ));

    let process = registries.processes.get(0x3000).expect("recorded");
    assert_eq!(process.kind, PtType::FREEBSD);
    assert_eq!(process.cr3.0, 0x3000);
}

#[test]
fn freebsd_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = freebsd_page(0x3000);
    words[freebsd::SELF_MAP_SLOT] |= 0x0001_0000_0000_0000;

    assert!(!freebsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x3000)
    ));
}

#[test]
fn freebsd_rejects_user_self_map() {
    let registries = Registries::new();
    let mut words = freebsd_page(0x3000);
    words[freebsd::SELF_MAP_SLOT] = 0x3067;

    assert!(!freebsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x3000)
    ));
}

///////////////////////////////////////////////////////////////////////////////
// OpenBSD
///////////////////////////////////////////////////////////////////////////////

#[test]
fn openbsd_matches() {
    let registries = Registries::new();
    let words = openbsd_page(0x4000);

    assert!(openbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x4000)
    ));

    let process = registries.processes.get(0x4000).expect("recorded");
    assert_eq!(process.kind, PtType::OPENBSD);
}

#[test]
fn openbsd_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = openbsd_page(0x4000);
    words[openbsd::SELF_MAP_SLOT] |= 0x0100_0000_0000_0000;

    assert!(!openbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x4000)
    ));
}

#[test]
fn openbsd_requires_every_kernel_slot() {
    let registries = Registries::new();
    let mut words = openbsd_page(0x4000);
    words[254] = 0;

    assert!(!openbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x4000)
    ));
}

///////////////////////////////////////////////////////////////////////////////
// NetBSD
///////////////////////////////////////////////////////////////////////////////

#[test]
fn netbsd_matches_either_direct_map_slot() {
    let registries = Registries::new();
    let words = netbsd_page(0x6000);

    assert!(netbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x6000)
    ));

    let mut words = netbsd_page(0x7000);
    words[256] = words[320];
    words[320] = 0;

    assert!(netbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x7000)
    ));

    assert_eq!(registries.processes.len(), 2);
    let process = registries.processes.get(0x7000).expect("recorded");
    assert_eq!(process.kind, PtType::NETBSD);
}

#[test]
fn netbsd_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = netbsd_page(0x6000);
    words[openbsd::SELF_MAP_SLOT] |= 0x4000_0000_0000_0000;

    assert!(!netbsd::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x6000)
    ));
}

///////////////////////////////////////////////////////////////////////////////
// Generic
///////////////////////////////////////////////////////////////////////////////

#[test]
fn generic_matches_naive_offset() {
    let registries = Registries::new();
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0011_1063;
    words[0x180] = 0x8063;

    let location = BlockLocation {
        offset: 0x1_8000,
        true_offset: 0x8000,
    };
    assert!(generic::detect(&registries.ctx(), block(&words), location));

    let process = registries.processes.get(0x8000).expect("recorded");
    assert_eq!(process.kind, PtType::GENERIC);
    assert_eq!(process.diff, 0);
    assert!(!registries.processes.contains(0x1_8000));
}

#[test]
fn generic_ignores_adjusted_offset() {
    let registries = Registries::new();
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0011_1063;
    words[0x180] = 0x1_8063;

    let location = BlockLocation {
        offset: 0x1_8000,
        true_offset: 0x8000,
    };
    assert!(!generic::detect(&registries.ctx(), block(&words), location));
}

#[test]
fn generic_ignores_lower_half() {
    let registries = Registries::new();
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0011_1063;
    words[0x80] = 0x8063;

    assert!(!generic::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x8000)
    ));
}

#[test]
fn generic_rejects_reserved_bit() {
    let registries = Registries::new();
    let mut words = vec![0u64; 512];
    words[0] = 0x0000_0000_0011_1063;
    words[0x180] = 0x0400_0000_0000_8063;

    assert!(!generic::detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0x8000)
    ));
}

///////////////////////////////////////////////////////////////////////////////
// Linux
///////////////////////////////////////////////////////////////////////////////

#[test]
fn linux_matches_at_own_offset() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();
    let words = linux_page(0);

    assert!(detector.detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0xa000)
    ));

    let process = registries.processes.get(0xa000).expect("recorded");
    assert_eq!(process.kind, PtType::LINUX_S);
    assert_eq!(process.cr3.0, 0xa000);
    assert_eq!(process.diff, 0);
    assert_eq!(process.group, Some(0));
}

#[test]
fn linux_rejects_populated_gap() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();
    let mut words = linux_page(0);
    words[0x1d2] = 0x1063;

    assert!(!detector.detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0xa000)
    ));
    assert_eq!(detector.group_count(), 0);
}

#[test]
fn linux_rejects_flag_mismatch() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();
    let mut words = linux_page(0);
    words[0x1fe] |= 0x100;

    assert!(!detector.detect(
        &registries.ctx(),
        block(&words),
        BlockLocation::contiguous(0xa000)
    ));
}

#[test]
fn linux_groups_by_lower_half() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();

    let first = linux_page(0x0000_0000_0060_1067);
    let second = linux_page(0x0000_0000_0060_1067);
    let third = linux_page(0x0000_0000_0070_1067);

    for (words, offset) in [(&first, 0x1000), (&second, 0x2000), (&third, 0x3000)] {
        assert!(detector.detect(
            &registries.ctx(),
            block(words),
            BlockLocation::contiguous(offset)
        ));
    }

    let group = |offset| registries.processes.get(offset).expect("recorded").group;
    assert_eq!(group(0x1000), Some(0));
    assert_eq!(group(0x2000), Some(0));
    assert_eq!(group(0x3000), Some(1));
    assert_eq!(detector.group_count(), 2);
}

#[test]
fn linux_upper_half_does_not_split_groups() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();

    let first = linux_page(0x0000_0000_0060_1067);
    let mut second = linux_page(0x0000_0000_0060_1067);
    second[0x105] = 0x0000_0000_0080_0063;

    assert!(detector.detect(
        &registries.ctx(),
        block(&first),
        BlockLocation::contiguous(0x1000)
    ));
    assert!(detector.detect(
        &registries.ctx(),
        block(&second),
        BlockLocation::contiguous(0x2000)
    ));
    assert_eq!(detector.group_count(), 1);
}

#[test]
fn linux_known_offset_opens_no_group() {
    let registries = Registries::new();
    let detector = LinuxDetector::new();
    let words = linux_page(0x0000_0000_0060_1067);
    let location = BlockLocation::contiguous(0x1000);

    assert!(detector.detect(&registries.ctx(), block(&words), location));
    assert!(detector.detect(&registries.ctx(), block(&words), location));
    assert_eq!(detector.group_count(), 1);

    // An offset already claimed by another family keeps its record and
    // leaves the groups untouched.
    let other = linux_page(0x0000_0000_0070_1067);
    assert!(registries.processes.insert(DetectedProc::new(
        PtType::WINDOWS,
        Pa(0x2000),
        0x2000,
        0x2000,
        block(&other)
    )));

    assert!(detector.detect(
        &registries.ctx(),
        block(&other),
        BlockLocation::contiguous(0x2000)
    ));
    assert_eq!(detector.group_count(), 1);

    let process = registries.processes.get(0x2000).expect("recorded");
    assert_eq!(process.kind, PtType::WINDOWS);
    assert_eq!(process.group, None);
}

#[test]
fn one_block_may_satisfy_several_detectors() {
    let registries = Registries::new();
    let mut words = windows_page(0x5000);
    words[0x180] = 0x5063;

    let location = BlockLocation::contiguous(0x5000);
    assert!(windows::detect(&registries.ctx(), block(&words), location));
    assert!(generic::detect(&registries.ctx(), block(&words), location));

    // Both matched, the registry keeps the first record for the offset.
    let process = registries.processes.get(0x5000).expect("recorded");
    assert_eq!(process.kind, PtType::WINDOWS);
}
