//! Local masternode activation state
//!
//! A node configured with an operator key tracks whether its own
//! masternode has been activated, either locally or remotely when its
//! announcement comes back around from the network (hot/cold setup).

use crate::service::ServiceAddress;
use meridian_core::Outpoint;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveState {
    Initial,
    Started,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMasternode {
    pub operator_pubkey: Vec<u8>,
    pub outpoint: Option<Outpoint>,
    pub service: Option<ServiceAddress>,
    pub state: ActiveState,
}

impl ActiveMasternode {
    pub fn new(operator_pubkey: Vec<u8>) -> Self {
        ActiveMasternode {
            operator_pubkey,
            outpoint: None,
            service: None,
            state: ActiveState::Initial,
        }
    }

    pub fn is_started(&self) -> bool {
        self.state == ActiveState::Started
    }

    /// The network accepted an announcement carrying our operator key:
    /// adopt its collateral and service address and mark us started.
    pub fn enable_remote(&mut self, outpoint: Outpoint, service: ServiceAddress) {
        if self.is_started() {
            return;
        }
        info!(masternode = %outpoint, service = %service, "local masternode remotely activated");
        self.outpoint = Some(outpoint);
        self.service = Some(service);
        self.state = ActiveState::Started;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Hash256;

    #[test]
    fn test_enable_remote_once() {
        let mut active = ActiveMasternode::new(vec![1; 32]);
        assert!(!active.is_started());

        let first = Outpoint::new(Hash256([1; 32]), 0);
        let service = ServiceAddress::parse("203.0.113.1:10100", 10100).unwrap();
        active.enable_remote(first, service);
        assert!(active.is_started());
        assert_eq!(active.outpoint, Some(first));

        // a second activation does not displace the first
        active.enable_remote(Outpoint::new(Hash256([2; 32]), 0), service);
        assert_eq!(active.outpoint, Some(first));
    }
}
