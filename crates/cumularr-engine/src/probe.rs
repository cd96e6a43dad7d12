//! Multi-service import probing.
//!
//! Services are asked in configuration order and the first to confirm an
//! import wins the attribution. A service that cannot be reached is
//! expected noise (an Arr restart, an open breaker) and logged at debug;
//! any other probe failure is a warning. Either way the service is skipped
//! and the remaining ones are still asked.

use std::sync::Arc;

use cumularr_core::{DownloadTarget, ImportHistory};
use tracing::{debug, info, warn};

/// Probe over the configured Arr services, in order.
pub(crate) struct ImportProbe {
    services: Vec<Arc<dyn ImportHistory>>,
}

impl ImportProbe {
    pub(crate) const fn new(services: Vec<Arc<dyn ImportHistory>>) -> Self {
        Self { services }
    }

    /// First service reporting the target imported, if any.
    pub(crate) async fn target_imported(&self, target: &DownloadTarget) -> Option<String> {
        for service in &self.services {
            match service.was_imported(&target.to).await {
                Ok(true) => return Some(service.service_name().to_string()),
                Ok(false) => {}
                Err(error) if error.is_unreachable() => {
                    debug!(
                        service = error.service(),
                        error = %error,
                        "history service unreachable; skipping"
                    );
                }
                Err(error) => {
                    warn!(
                        service = error.service(),
                        error = %error,
                        "history query failed; skipping"
                    );
                }
            }
        }
        None
    }

    /// Whether every file target in the plan has been imported by at least
    /// one service. Plans without file targets never count as imported.
    pub(crate) async fn plan_imported(&self, targets: &[DownloadTarget]) -> bool {
        let mut any_file = false;
        for target in targets.iter().filter(|target| target.is_file()) {
            any_file = true;
            match self.target_imported(target).await {
                Some(service) => {
                    info!(target = %target, service, "import confirmed");
                }
                None => return false,
            }
        }
        any_file
    }
}
