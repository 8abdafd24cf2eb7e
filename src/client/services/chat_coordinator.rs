use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::client::config::ClientConfig;
use crate::client::services::chat_session::{ChatSession, SessionEvent};
use crate::client::services::history_service::HistoryService;
use crate::client::services::message_log::MessageLog;
use crate::common::error::ChatError;
use crate::common::models::ChatMessage;

/// What the coordinator reports to the embedding UI layer.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    HistoryLoading { group_id: i64 },
    HistoryLoaded { group_id: i64, messages: Vec<ChatMessage> },
    /// Retryable: call `retry()` or switch again.
    HistoryFailed { group_id: i64, error: String },
    MessageAppended { group_id: i64, message: ChatMessage },
    ConnectionStatus { connected: bool },
}

#[derive(Debug, Default)]
struct ActiveGroup {
    group_id: Option<i64>,
    /// Bumped on every switch. Async completions compare the epoch they
    /// captured at dispatch and drop themselves when it has moved on.
    epoch: u64,
    loading: bool,
}

/// Drives the group switch sequence: tear down the old session, load the
/// new group's history, then subscribe live. Live traffic is merged into
/// the message log via the session event pump; frames for a group that is
/// no longer the active selection are dropped.
pub struct ChatCoordinator {
    session: Arc<ChatSession>,
    history: HistoryService,
    log: Arc<Mutex<MessageLog>>,
    active: Arc<Mutex<ActiveGroup>>,
    /// Serializes disconnect/fetch/connect sequences so two overlapping
    /// switches can never interleave their session operations. A superseded
    /// switch exits at its next epoch check and releases this quickly.
    flow: Mutex<()>,
    events: mpsc::UnboundedSender<ChatEvent>,
    _pump: JoinHandle<()>,
}

impl ChatCoordinator {
    pub fn new(config: &ClientConfig) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (session, session_events) = ChatSession::new(
            config.websocket_url.clone(),
            Duration::from_secs(config.handshake_timeout_secs),
        );
        let session = Arc::new(session);
        let history = HistoryService::new(config.api_base_url.clone());
        let log = Arc::new(Mutex::new(MessageLog::new()));
        let active = Arc::new(Mutex::new(ActiveGroup::default()));
        let (events, receiver) = mpsc::unbounded_channel();

        let pump = tokio::spawn(Self::pump_session_events(
            session_events,
            Arc::clone(&log),
            Arc::clone(&active),
            events.clone(),
        ));

        let coordinator = Self {
            session,
            history,
            log,
            active,
            flow: Mutex::new(()),
            events,
            _pump: pump,
        };
        (coordinator, receiver)
    }

    /// Make `group_id` the active chat: clear the display, tear down the
    /// previous session, load history, then subscribe live.
    ///
    /// Switching again while this is in flight is safe: the epoch captured
    /// here is re-checked after every await, and a completion that lost the
    /// race is dropped without touching the new group's state.
    pub async fn switch_to(&self, group_id: i64) -> Result<(), ChatError> {
        let epoch = {
            let mut active = self.active.lock().await;
            active.epoch += 1;
            active.group_id = Some(group_id);
            active.loading = true;
            active.epoch
        };
        // Clear immediately so the previous group's messages never show
        // under the new group's header.
        self.log.lock().await.clear();
        let _ = self.events.send(ChatEvent::HistoryLoading { group_id });

        let _flow = self.flow.lock().await;
        if self.active.lock().await.epoch != epoch {
            debug!("[CHAT] switch to group {} superseded before start", group_id);
            return Ok(());
        }

        self.session.disconnect().await;

        let history = self.history.fetch(group_id).await;
        {
            let mut active = self.active.lock().await;
            if active.epoch != epoch {
                debug!("[CHAT] stale history for group {} discarded", group_id);
                return Ok(());
            }
            match history {
                Ok(messages) => {
                    let mut log = self.log.lock().await;
                    log.replace(messages);
                    let snapshot = log.snapshot();
                    drop(log);
                    let _ = self.events.send(ChatEvent::HistoryLoaded {
                        group_id,
                        messages: snapshot,
                    });
                }
                Err(e) => {
                    active.loading = false;
                    warn!("[CHAT] history load for group {} failed: {}", group_id, e);
                    let _ = self.events.send(ChatEvent::HistoryFailed {
                        group_id,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.session.connect(group_id).await {
            let mut active = self.active.lock().await;
            if active.epoch == epoch {
                active.loading = false;
            }
            return Err(e);
        }

        let mut active = self.active.lock().await;
        if active.epoch != epoch {
            // A newer switch is queued on the flow lock; it will tear this
            // connection down first thing.
            debug!("[CHAT] switch to group {} superseded", group_id);
            return Ok(());
        }
        active.loading = false;
        info!("[CHAT] group {} ready", group_id);
        Ok(())
    }

    /// Re-run the switch for the currently selected group, the retry
    /// affordance after a failed history load or handshake.
    pub async fn retry(&self) -> Result<(), ChatError> {
        let group_id = self.active.lock().await.group_id;
        match group_id {
            Some(group_id) => self.switch_to(group_id).await,
            None => Ok(()),
        }
    }

    /// Fire-and-forget send to the active group. Blank input is dropped,
    /// and sending while disconnected is reported and dropped, never
    /// queued or retried.
    pub async fn send(&self, content: &str) -> Result<(), ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }
        let group_id = match self.active.lock().await.group_id {
            Some(id) => id,
            None => {
                warn!("[CHAT] send ignored: no active group");
                return Ok(());
            }
        };
        match self.session.send(group_id, content).await {
            Err(ChatError::SendRejected) => {
                warn!("[CHAT] message to group {} dropped: not connected", group_id);
                Ok(())
            }
            other => other,
        }
    }

    pub async fn active_group(&self) -> Option<i64> {
        self.active.lock().await.group_id
    }

    pub async fn is_loading(&self) -> bool {
        self.active.lock().await.loading
    }

    pub async fn is_connected(&self) -> bool {
        self.session.is_connected().await
    }

    /// Snapshot of the display sequence.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.log.lock().await.snapshot()
    }

    async fn pump_session_events(
        mut session_events: mpsc::UnboundedReceiver<SessionEvent>,
        log: Arc<Mutex<MessageLog>>,
        active: Arc<Mutex<ActiveGroup>>,
        events: mpsc::UnboundedSender<ChatEvent>,
    ) {
        while let Some(event) = session_events.recv().await {
            match event {
                SessionEvent::Status { connected } => {
                    let _ = events.send(ChatEvent::ConnectionStatus { connected });
                }
                SessionEvent::Message(message) => {
                    {
                        let active = active.lock().await;
                        if active.group_id != Some(message.group_id) {
                            debug!(
                                "[CHAT] message {} for inactive group {} dropped",
                                message.id, message.group_id
                            );
                            continue;
                        }
                    }
                    let mut log = log.lock().await;
                    if log.insert(message.clone()) {
                        drop(log);
                        let _ = events.send(ChatEvent::MessageAppended {
                            group_id: message.group_id,
                            message,
                        });
                    } else {
                        debug!("[CHAT] duplicate message {} ignored", message.id);
                    }
                }
            }
        }
    }
}
