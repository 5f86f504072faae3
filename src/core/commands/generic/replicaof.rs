// src/core/commands/generic/replicaof.rs

//! `REPLICAOF host port | NO ONE`: switches the instance's replication role.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::state::replication::ReplicationRole;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Replicaof {
    /// `None` for `REPLICAOF NO ONE` (promote to primary).
    pub primary: Option<(String, u16)>,
}

impl ParseCommand for Replicaof {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 2 {
            return Err(ZirconDBError::WrongArgumentCount("REPLICAOF".to_string()));
        }
        let host = extract_string(&args[0])?;
        let port = extract_string(&args[1])?;
        if host.eq_ignore_ascii_case("no") && port.eq_ignore_ascii_case("one") {
            return Ok(Replicaof { primary: None });
        }
        let port: u16 = port
            .parse()
            .map_err(|_| ZirconDBError::InvalidState("Invalid master port".to_string()))?;
        Ok(Replicaof {
            primary: Some((host, port)),
        })
    }
}

#[async_trait]
impl ExecutableCommand for Replicaof {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        match &self.primary {
            Some((host, port)) => {
                let addr = format!("{host}:{port}");
                info!("REPLICAOF {} enabled", addr);
                ctx.state
                    .replication
                    .set_role(ReplicationRole::Replica { primary_addr: addr });
            }
            None => {
                info!("MASTER MODE enabled");
                ctx.state.replication.set_role(ReplicationRole::Primary);
            }
        }
        Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Replicaof {
    fn name(&self) -> &'static str {
        "replicaof"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        match &self.primary {
            Some((host, port)) => vec![
                Bytes::from(host.clone()),
                Bytes::from(port.to_string()),
            ],
            None => vec![Bytes::from_static(b"NO"), Bytes::from_static(b"ONE")],
        }
    }
}
