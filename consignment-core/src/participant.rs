//! Participant registry
//!
//! Participants are written once and never updated. Roles are stored as
//! supplied; only container creation interprets them.

use crate::{context::TxContext, provenance, types::Participant, Error, Result};

/// Register a participant under a fresh key
pub fn register_participant(ctx: &TxContext<'_>, participant: Participant) -> Result<Participant> {
    if let Some(existing) = ctx.read::<Participant>(&participant.hash_id)? {
        return Err(Error::PreconditionFailed(format!(
            "Participant {} already exists ({} <{}>)",
            participant.hash_id, existing.name, existing.email_id
        )));
    }

    ctx.put(&participant.hash_id, &participant)?;

    tracing::info!(
        participant = %participant.hash_id,
        role = %participant.role,
        "Participant registered"
    );

    Ok(participant)
}

/// Look up a registered participant
pub fn get_participant(ctx: &TxContext<'_>, hash_id: &str) -> Result<Participant> {
    provenance::track(ctx, hash_id)
}
