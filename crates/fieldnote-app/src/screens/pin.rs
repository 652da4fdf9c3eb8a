//! PIN lock screen.

use crate::pin::PinVault;
use fieldnote_core::Result;

/// Controller for the PIN screen: first entry sets the PIN, later entries
/// are compared against it.
pub struct PinController {
    vault: PinVault,
}

impl PinController {
    pub fn new(vault: PinVault) -> Self {
        Self { vault }
    }

    /// Validate (or set, on first use) the PIN.
    pub async fn validate(&self, pin: &str) -> Result<bool> {
        self.vault.validate(pin).await
    }
}
