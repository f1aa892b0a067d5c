//! Actor front-end for the contract
//!
//! One tokio task owns the [`Contract`] and runs invocations one at a time in
//! mailbox order, so read-modify-write sequences on the ledger never
//! interleave between callers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              ContractHandle (Clone)                   │
//! │         Sends messages to actor mailbox               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             ContractActor (Single Task)               │
//! │                       │                               │
//! │                       ▼                               │
//! │              Contract::invoke()                       │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    dispatch::{Contract, Response},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// One line of the node's stdin protocol: `{"function": "...", "args": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Function name
    pub function: String,
    /// Positional arguments, empty when omitted
    #[serde(default)]
    pub args: Vec<String>,
}

/// Message sent to the contract actor
#[derive(Debug)]
pub enum ContractMessage {
    /// Run one invocation
    Invoke {
        /// Function name
        function: String,
        /// Positional arguments
        args: Vec<String>,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<u8>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes contract messages
#[derive(Debug)]
pub struct ContractActor {
    /// Contract owned by this actor
    contract: Contract,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<ContractMessage>,
}

impl ContractActor {
    /// Create new actor
    pub fn new(contract: Contract, mailbox: mpsc::Receiver<ContractMessage>) -> Self {
        Self { contract, mailbox }
    }

    /// Run the actor event loop until shutdown or every handle is dropped
    pub async fn run(mut self) {
        let mut handled = 0u64;

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                ContractMessage::Invoke {
                    function,
                    args,
                    response,
                } => {
                    let result = self.contract.invoke(&function, &args);
                    handled += 1;

                    if response.send(result).is_err() {
                        tracing::debug!(function = %function, "Caller dropped before reply");
                    }
                }

                ContractMessage::Shutdown => break,
            }
        }

        tracing::info!(invocations = handled, "Contract actor stopped");
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct ContractHandle {
    sender: mpsc::Sender<ContractMessage>,
}

impl ContractHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<ContractMessage>) -> Self {
        Self { sender }
    }

    /// Invoke a contract function
    pub async fn invoke(&self, function: impl Into<String>, args: Vec<String>) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ContractMessage::Invoke {
                function: function.into(),
                args,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Run one protocol line and build its response
    ///
    /// Blank lines produce no response. A line that does not parse as an
    /// [`Invocation`] gets an `InvalidArgument` error response.
    pub async fn invoke_line(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Invocation>(line) {
            Ok(invocation) => {
                Response::from_result(self.invoke(invocation.function, invocation.args).await)
            }
            Err(e) => Response::error(&Error::InvalidArgument(format!(
                "Malformed invocation: {}",
                e
            ))),
        };
        Some(response)
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ContractMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the contract actor with a bounded mailbox
pub fn spawn_contract_actor(contract: Contract, mailbox_capacity: usize) -> ContractHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = ContractActor::new(contract, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    ContractHandle::new(tx)
}
