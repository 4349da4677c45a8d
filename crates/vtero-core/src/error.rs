/// An error that can occur while scanning a memory dump.
#[derive(thiserror::Error, Debug)]
pub enum VteroError {
    /// An I/O error occurred while opening, mapping or reading the dump.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The VMCS detector was activated without any candidate guest CR3.
    ///
    /// VMCS detection is a second pass; it anchors on page-table roots
    /// found by a previous scan.
    #[error("VMCS detection requires at least one candidate CR3")]
    MissingVmcsCandidates,

    /// The scan geometry is invalid.
    #[error("Invalid scan options: {0}")]
    InvalidOptions(&'static str),
}
