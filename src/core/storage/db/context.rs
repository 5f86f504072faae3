// src/core/storage/db/context.rs

use super::core::{Db, Keyspace};
use crate::core::ZirconDBError;
use crate::core::state::ServerState;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::MutexGuard;

/// The keyspace guards held while a command executes.
///
/// `Single` is the normal path. `Multi` is used inside `EXEC`, where the
/// guards for the session's current DB plus every watched DB are acquired in
/// ascending index order before the batch runs. `All` is used by commands
/// that operate on every database at once.
pub enum ExecutionLocks<'a> {
    None,
    Single {
        guard: MutexGuard<'a, Keyspace>,
    },
    Multi {
        guards: BTreeMap<usize, MutexGuard<'a, Keyspace>>,
    },
    All {
        /// One guard per database, positioned by database index.
        guards: Vec<MutexGuard<'a, Keyspace>>,
    },
}

/// `ExecutionContext` provides all the state and locks required to execute a `Command`.
pub struct ExecutionContext<'a> {
    pub state: Arc<ServerState>,
    pub locks: ExecutionLocks<'a>,
    pub db: Arc<Db>,
    pub session_id: u64,
}

impl<'a> ExecutionContext<'a> {
    /// The keyspace of the session's current database.
    pub fn keyspace_mut(&mut self) -> Result<&mut Keyspace, ZirconDBError> {
        let index = self.db.index;
        match &mut self.locks {
            ExecutionLocks::Single { guard } => Ok(&mut *guard),
            ExecutionLocks::Multi { guards } => guards
                .get_mut(&index)
                .map(|g| &mut **g)
                .ok_or_else(|| ZirconDBError::Internal("required keyspace guard missing".into())),
            ExecutionLocks::All { guards } => guards
                .get_mut(index)
                .map(|g| &mut **g)
                .ok_or_else(|| ZirconDBError::Internal("required keyspace guard missing".into())),
            ExecutionLocks::None => Err(ZirconDBError::Internal(
                "command executed without a keyspace guard".into(),
            )),
        }
    }
}
