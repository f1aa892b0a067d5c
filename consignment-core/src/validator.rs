//! Entity validator
//!
//! Gates checked before any mutation is applied. Nothing here writes.

use crate::{
    codec::Entity,
    context::TxContext,
    types::{Container, ContainerStatus, ParticipantRole},
    Error, Result,
};

/// Check the positional argument count of `operation`
pub fn expect_arity(operation: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "Incorrect number of arguments for {}. Expecting {}, got {}",
            operation,
            expected,
            args.len()
        )));
    }
    Ok(())
}

/// New containers may only be granted to a Transporter
pub fn require_transporter(owner: &str, owner_role: &str) -> Result<()> {
    match ParticipantRole::parse(owner_role) {
        Some(ParticipantRole::Transporter) => Ok(()),
        Some(role) => Err(Error::PreconditionFailed(format!(
            "New owner {} is not a Transporter (role: {})",
            owner, role
        ))),
        None => Err(Error::PreconditionFailed(format!(
            "New owner {} has no recognised role (role: {:?})",
            owner, owner_role
        ))),
    }
}

/// Packages can only go into an Available container
pub fn require_available(hash_id: &str, container: &Container) -> Result<()> {
    if container.status != Some(ContainerStatus::Available) {
        return Err(Error::PreconditionFailed(format!(
            "Container {} is not Available for loading packages (status: {:?})",
            hash_id,
            container.status_str()
        )));
    }
    Ok(())
}

/// Read a record that must already exist
pub fn require_existing<T: Entity>(ctx: &TxContext<'_>, key: &str) -> Result<T> {
    ctx.read(key)?
        .ok_or_else(|| Error::NotFound(format!("{} {} does not exist", T::KIND, key)))
}

/// Parse a caller-supplied container status
pub fn parse_container_status(value: &str) -> Result<ContainerStatus> {
    ContainerStatus::parse(value).ok_or_else(|| {
        Error::InvalidArgument(format!("Unknown container status: {:?}", value))
    })
}

/// Split a comma-separated hashId list, dropping empty segments
pub fn split_container_ids(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cargo;
    use ledger_store::{MemoryStore, TxnId};

    fn args(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_expect_arity() {
        assert!(expect_arity("addNewContainer", &args(11), 11).is_ok());

        let err = expect_arity("addNewContainer", &args(10), 11).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("Expecting 11"));
    }

    #[test]
    fn test_require_transporter() {
        assert!(require_transporter("P1", "Transporter").is_ok());

        let err = require_transporter("P1", "Exporter").unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
        assert!(err.to_string().contains("P1"));
        assert!(err.to_string().contains("role: Exporter"));

        let err = require_transporter("P1", "transporter").unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
        assert!(err.to_string().contains("no recognised role"));
    }

    #[test]
    fn test_require_available() {
        let mut container = Container {
            status: Some(ContainerStatus::Available),
            ..Default::default()
        };
        assert!(require_available("1001", &container).is_ok());

        container.status = Some(ContainerStatus::Loaded);
        let err = require_available("1001", &container).unwrap_err();
        assert!(err.to_string().contains("Loaded"));

        assert!(require_available("1001", &Container::default()).is_err());
    }

    #[test]
    fn test_require_existing() {
        let store = MemoryStore::new();
        let ctx = TxContext::new(&store, TxnId::from("t1"));

        let err = require_existing::<Cargo>(&ctx, "C1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("cargo C1"));

        ctx.put("C1", &Cargo::default()).unwrap();
        assert!(require_existing::<Cargo>(&ctx, "C1").is_ok());
    }

    #[test]
    fn test_parse_container_status() {
        assert_eq!(
            parse_container_status("CustomsPending").unwrap(),
            ContainerStatus::CustomsPending
        );
        assert!(matches!(
            parse_container_status("In-Transit"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_split_container_ids() {
        assert_eq!(split_container_ids("1001,1002"), vec!["1001", "1002"]);
        assert_eq!(split_container_ids("1001,,1001,"), vec!["1001", "1001"]);
        assert!(split_container_ids("").is_empty());
    }
}
