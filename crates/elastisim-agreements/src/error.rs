use thiserror::Error;

use elastisim_core::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgreementError {
    #[error("cannot swap nodes: {0} has no agreement")]
    NotInStore(NodeId),
}
