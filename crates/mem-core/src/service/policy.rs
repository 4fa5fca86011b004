//! # Policy API Implementation
//!
//! The auto-online policy is a single system-wide attribute sharing the
//! block-state vocabulary. Reading tolerates nothing; setting tolerates an
//! unreadable current value and proceeds to write.

use tracing::info;

use mem_types::{MemError, OnlinePolicy};

use crate::ports::inbound::PolicyApi;
use crate::ports::outbound::{AttrStore, CxlTopology};

use super::{MemoryService, POLICY_ATTR};

impl<A: AttrStore, T: CxlTopology> PolicyApi for MemoryService<A, T> {
    fn policy(&self) -> Result<OnlinePolicy, MemError> {
        let text = self.attrs.read(POLICY_ATTR)?;
        OnlinePolicy::from_kernel_name(text.trim()).ok_or_else(|| MemError::Unparseable {
            path: POLICY_ATTR.to_string(),
            value: text,
        })
    }

    fn set_policy(&mut self, policy: OnlinePolicy) -> Result<(), MemError> {
        if self.policy().ok() == Some(policy) {
            info!("Auto-online policy already {policy}, skipping");
            return Ok(());
        }

        self.attrs.write_verified(POLICY_ATTR, policy.kernel_name())?;
        info!("Set auto-online policy to {policy}");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockAttrStore, MockTopology};
    use mem_types::BlockState;

    fn service() -> MemoryService<MockAttrStore, MockTopology> {
        MemoryService::new(MockAttrStore::new(), MockTopology::new())
    }

    #[test]
    fn test_policy_round_trip() {
        let mut svc = service();
        svc.attrs().set_policy(BlockState::Offline);
        assert_eq!(svc.policy().unwrap(), BlockState::Offline);

        svc.set_policy(BlockState::Movable).unwrap();
        assert_eq!(svc.policy().unwrap(), BlockState::Movable);
        assert_eq!(svc.attrs().write_count(POLICY_ATTR), 1);
    }

    #[test]
    fn test_set_policy_same_value_writes_nothing() {
        let mut svc = service();
        svc.attrs().set_policy(BlockState::Kernel);

        svc.set_policy(BlockState::Kernel).unwrap();
        assert_eq!(svc.attrs().write_count(POLICY_ATTR), 0);
    }

    #[test]
    fn test_set_policy_over_unreadable_current_value() {
        // A garbled current value must not block setting a sane one.
        let mut svc = service();
        svc.attrs().put_attr(POLICY_ATTR, "garbage");

        assert!(matches!(svc.policy(), Err(MemError::Unparseable { .. })));
        svc.set_policy(BlockState::Online).unwrap();
        assert_eq!(svc.policy().unwrap(), BlockState::Online);
    }

    #[test]
    fn test_policy_missing_attribute() {
        let svc = service();
        assert!(matches!(
            svc.policy(),
            Err(MemError::ResourceUnavailable { .. })
        ));
    }
}
