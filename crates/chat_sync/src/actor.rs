//! Runs a [`SyncSession`] on its own task
//!
//! UI-facing code holds a cloneable [`SessionHandle`]. Commands and store
//! deliveries are processed by one task, so identity changes can never
//! interleave with each other or with event translation.

use crate::registry::Subscribed;
use crate::session::{SessionEvent, SyncSession};
use crate::store::RemoteStore;
use crate::{Result, SyncError};
use std::ops::ControlFlow;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of the command queue
const COMMAND_BUFFER: usize = 64;

enum Command {
    SetCurrentUser {
        identifier: String,
        ack: oneshot::Sender<()>,
    },
    SetCurrentPeer {
        peer: Option<String>,
        ack: oneshot::Sender<()>,
    },
    SendMessage {
        text: String,
        ack: oneshot::Sender<Option<String>>,
    },
    WatchUsers {
        ack: oneshot::Sender<Subscribed>,
    },
    UnwatchUsers {
        ack: oneshot::Sender<bool>,
    },
    AddUser {
        identifier: String,
        ack: oneshot::Sender<bool>,
    },
    CurrentPath {
        ack: oneshot::Sender<Option<String>>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

/// Owns the session task; dropping it does not stop the task, `shutdown` does
pub struct SessionTask {
    join: JoinHandle<()>,
}

impl SessionTask {
    /// Wait for the session task to finish
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| SyncError::SessionClosed(e.to_string()))
    }
}

impl SessionHandle {
    /// Move `session` onto a new task.
    ///
    /// Returns the command handle, the task, and the stream of events the
    /// session produces.
    pub fn spawn<S>(
        session: SyncSession<S>,
    ) -> (Self, SessionTask, mpsc::UnboundedReceiver<SessionEvent>)
    where
        S: RemoteStore + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(run(session, commands_rx, events_tx));
        (
            Self {
                commands: commands_tx,
            },
            SessionTask { join },
            events_rx,
        )
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(build(ack))
            .await
            .map_err(|_| SyncError::SessionClosed("command queue closed".to_string()))?;
        reply
            .await
            .map_err(|_| SyncError::SessionClosed("session task ended".to_string()))
    }

    pub async fn set_current_user(&self, identifier: impl Into<String>) -> Result<()> {
        let identifier = identifier.into();
        self.request(|ack| Command::SetCurrentUser { identifier, ack })
            .await
    }

    /// `None` selects the general room
    pub async fn set_current_peer(&self, peer: Option<&str>) -> Result<()> {
        let peer = peer.map(str::to_string);
        self.request(|ack| Command::SetCurrentPeer { peer, ack }).await
    }

    /// Returns the key of the appended message, `None` when no conversation resolves
    pub async fn send_message(&self, text: impl Into<String>) -> Result<Option<String>> {
        let text = text.into();
        self.request(|ack| Command::SendMessage { text, ack }).await
    }

    pub async fn watch_users(&self) -> Result<Subscribed> {
        self.request(|ack| Command::WatchUsers { ack }).await
    }

    pub async fn unwatch_users(&self) -> Result<bool> {
        self.request(|ack| Command::UnwatchUsers { ack }).await
    }

    pub async fn add_user(&self, identifier: impl Into<String>) -> Result<bool> {
        let identifier = identifier.into();
        self.request(|ack| Command::AddUser { identifier, ack }).await
    }

    /// Path of the conversation the session currently follows
    pub async fn current_path(&self) -> Result<Option<String>> {
        self.request(|ack| Command::CurrentPath { ack }).await
    }

    /// Remove every subscription and stop the session task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|ack| Command::Shutdown { ack }).await
    }
}

async fn run<S: RemoteStore>(
    mut session: SyncSession<S>,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    tracing::debug!("session task started");
    loop {
        tokio::select! {
            // Commands first so an acknowledged change is never overtaken
            // by events of the conversation it replaced
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break };
                if apply(&mut session, command).is_break() {
                    break;
                }
            }
            event = session.next_event() => {
                let Some(event) = event else { break };
                if events.send(event).is_err() {
                    tracing::debug!("event consumer dropped");
                    break;
                }
            }
        }
    }
    session.close();
    tracing::debug!("session task stopped");
}

fn apply<S: RemoteStore>(session: &mut SyncSession<S>, command: Command) -> ControlFlow<()> {
    match command {
        Command::SetCurrentUser { identifier, ack } => {
            session.set_current_user(&identifier);
            let _ = ack.send(());
        }
        Command::SetCurrentPeer { peer, ack } => {
            session.set_current_peer(peer.as_deref());
            let _ = ack.send(());
        }
        Command::SendMessage { text, ack } => {
            let _ = ack.send(session.send_message(&text));
        }
        Command::WatchUsers { ack } => {
            let _ = ack.send(session.watch_users());
        }
        Command::UnwatchUsers { ack } => {
            let _ = ack.send(session.unwatch_users());
        }
        Command::AddUser { identifier, ack } => {
            let _ = ack.send(session.add_user(&identifier).is_some());
        }
        Command::CurrentPath { ack } => {
            let _ = ack.send(session.current_path().map(str::to_string));
        }
        Command::Shutdown { ack } => {
            session.close();
            let _ = ack.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}
