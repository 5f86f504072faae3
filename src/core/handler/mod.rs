// src/core/handler/mod.rs

//! Command dispatch: the router that validates and routes every parsed
//! command, and the transaction handler implementing `MULTI`/`EXEC`.

pub mod command_router;
pub mod transaction_handler;

pub use command_router::Router;
pub use transaction_handler::TransactionHandler;
