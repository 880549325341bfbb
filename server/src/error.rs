use thiserror::Error;

/// Invariant-violation paths (spec §7's InvariantViolation): logged and
/// swallowed by callers, never allowed to bring the process down.
/// `AlreadyPresent` also stands in for §7's ResourceError on the join
/// path — `Broker::join` surfaces it as the one failure
/// `handle_connection` reacts to with `FAIL_EARLY`.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("member already present in room")]
    AlreadyPresent,

    #[error("member not present in room")]
    NotPresent,
}
