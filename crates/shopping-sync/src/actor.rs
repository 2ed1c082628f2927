//! Shopping List Actor
//!
//! Owns the `ListState` and is the only thing that mutates it. Auth-state
//! reports, snapshot deliveries, UI commands and mutation completions all
//! arrive over channels and are handled one at a time. Store and identity
//! round trips run in spawned tasks so the loop never waits on them.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::backend::{DocumentStore, IdentityProvider};
use crate::error::{SyncError, SyncResult};
use crate::gateway::{ClearOutcome, MutationGateway};
use crate::model::{Identity, Item, ItemId, ItemQuery, ProviderKind};
use crate::state::{ListState, ListView};
use crate::subscription::LiveSubscription;

/// Alerts are user-facing messages; a slow UI only loses old ones
const ALERT_CAPACITY: usize = 16;

/// Intents sent by the UI
#[derive(Debug)]
pub enum ListCommand {
    SignIn {
        provider: ProviderKind,
        reply: oneshot::Sender<SyncResult<Identity>>,
    },
    SignOut {
        reply: oneshot::Sender<SyncResult<()>>,
    },
    AddItem {
        name: String,
        store: String,
        reply: oneshot::Sender<SyncResult<ItemId>>,
    },
    /// Submit the draft of one store section
    AddItemToStore {
        store: String,
        reply: oneshot::Sender<SyncResult<ItemId>>,
    },
    SetDraft {
        store: String,
        text: String,
    },
    ToggleItem {
        id: ItemId,
        completed: bool,
        done: oneshot::Sender<()>,
    },
    DeleteItem {
        id: ItemId,
        done: oneshot::Sender<()>,
    },
    ClearCompleted {
        done: oneshot::Sender<ClearOutcome>,
    },
}

/// Internal notifications fed back into the loop
enum ListEvent {
    Snapshot {
        generation: u64,
        result: SyncResult<Vec<Item>>,
    },
    DraftSubmitted {
        store: String,
    },
}

pub struct ShoppingListActor {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    gateway: MutationGateway,
    query: ItemQuery,
    state: ListState,
    live: LiveSubscription,
    auth: watch::Receiver<Option<Identity>>,
    commands: mpsc::UnboundedReceiver<ListCommand>,
    events_tx: mpsc::UnboundedSender<ListEvent>,
    events: mpsc::UnboundedReceiver<ListEvent>,
    view: watch::Sender<ListView>,
    alerts: broadcast::Sender<String>,
}

impl ShoppingListActor {
    /// Build the actor and the handle the UI talks to. Run the actor with
    /// `run()` on the async runtime of your choice.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> (Self, ShoppingListHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(ListView::default());
        let (alerts, _) = broadcast::channel(ALERT_CAPACITY);
        let auth = identity.observe();

        let handle = ShoppingListHandle {
            commands: commands_tx,
            view: view_rx,
            alerts: alerts.clone(),
        };
        let actor = Self {
            identity,
            gateway: MutationGateway::new(store.clone()),
            store,
            query: ItemQuery::newest_items(),
            state: ListState::new(),
            live: LiveSubscription::new(),
            auth,
            commands,
            events_tx,
            events,
            view,
            alerts,
        };
        (actor, handle)
    }

    /// Spawn on the ambient tokio runtime
    pub fn spawn(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> ShoppingListHandle {
        let (actor, handle) = Self::new(store, identity);
        tokio::spawn(actor.run());
        handle
    }

    /// Process until every handle is dropped
    pub async fn run(mut self) {
        let initial = self.auth.borrow_and_update().clone();
        self.on_auth_changed(initial).await;
        self.publish();

        let mut auth_open = true;
        loop {
            tokio::select! {
                biased;
                changed = self.auth.changed(), if auth_open => match changed {
                    Ok(()) => {
                        let identity = self.auth.borrow_and_update().clone();
                        self.on_auth_changed(identity).await;
                    }
                    Err(_) => {
                        log::warn!("Identity provider dropped its auth channel");
                        auth_open = false;
                    }
                },
                Some(event) = self.events.recv() => self.on_event(event),
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
            self.publish();
        }

        self.live.close();
        log::info!("Shopping list stopped");
    }

    async fn on_auth_changed(&mut self, identity: Option<Identity>) {
        let change = self.state.apply_identity(identity.clone());

        match identity {
            None => {
                self.live.close();
                self.state.clear_view();
                if change.is_change() {
                    log::info!("Signed out, live query closed");
                }
            }
            Some(viewer) => {
                if !change.is_change() && self.live.is_open() {
                    return;
                }
                self.live.close();
                self.state.clear_view();
                log::info!("Opening live query for {}", viewer.uid);
                self.open_live_query(&viewer).await;
            }
        }
    }

    async fn open_live_query(&mut self, viewer: &Identity) {
        let events = self.events_tx.clone();
        let opened = self
            .live
            .open(self.store.as_ref(), &self.query, viewer, move |generation, result| {
                let _ = events.send(ListEvent::Snapshot { generation, result });
            })
            .await;

        if let Err(e) = opened {
            log::error!("Error fetching items: {}", e);
            self.state.apply_subscription_error();
        }
    }

    fn on_event(&mut self, event: ListEvent) {
        match event {
            ListEvent::Snapshot { generation, result } => {
                if !self.live.is_current(generation) {
                    log::trace!("Dropping snapshot from closed query #{}", generation);
                    return;
                }
                match result {
                    Ok(items) => self.state.apply_snapshot(items),
                    Err(e) => {
                        log::error!("Error fetching items: {}", e);
                        self.state.apply_subscription_error();
                    }
                }
            }
            ListEvent::DraftSubmitted { store } => self.state.reset_draft(&store),
        }
    }

    fn on_command(&mut self, command: ListCommand) {
        let owner = self.state.identity().cloned();

        match command {
            ListCommand::SignIn { provider, reply } => {
                let identity = self.identity.clone();
                let alerts = self.alerts.clone();
                tokio::spawn(async move {
                    let result = identity.sign_in(provider).await;
                    if let Err(e) = &result {
                        log::error!("Error signing in: {}", e);
                        let _ = alerts.send(format!("Sign in failed: {}", e));
                    }
                    let _ = reply.send(result);
                });
            }
            ListCommand::SignOut { reply } => {
                let identity = self.identity.clone();
                let alerts = self.alerts.clone();
                tokio::spawn(async move {
                    let result = identity.sign_out().await;
                    if let Err(e) = &result {
                        log::error!("Error signing out: {}", e);
                        let _ = alerts.send(format!("Sign out failed: {}", e));
                    }
                    let _ = reply.send(result);
                });
            }
            ListCommand::AddItem { name, store, reply } => {
                let gateway = self.gateway.clone();
                let alerts = self.alerts.clone();
                tokio::spawn(async move {
                    let result = gateway.add_item(owner.as_ref(), &name, &store).await;
                    alert_if_signed_out(&alerts, &result);
                    let _ = reply.send(result);
                });
            }
            ListCommand::AddItemToStore { store, reply } => {
                let name = self.state.draft(&store).to_string();
                let gateway = self.gateway.clone();
                let alerts = self.alerts.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = gateway.add_item_to_store(owner.as_ref(), &store, &name).await;
                    alert_if_signed_out(&alerts, &result);
                    if result.is_ok() {
                        let _ = events.send(ListEvent::DraftSubmitted { store });
                    }
                    let _ = reply.send(result);
                });
            }
            ListCommand::SetDraft { store, text } => self.state.set_draft(&store, text),
            ListCommand::ToggleItem { id, completed, done } => {
                let gateway = self.gateway.clone();
                tokio::spawn(async move {
                    gateway.toggle_item(owner.as_ref(), &id, completed).await;
                    let _ = done.send(());
                });
            }
            ListCommand::DeleteItem { id, done } => {
                let gateway = self.gateway.clone();
                tokio::spawn(async move {
                    gateway.delete_item(owner.as_ref(), &id).await;
                    let _ = done.send(());
                });
            }
            ListCommand::ClearCompleted { done } => {
                let gateway = self.gateway.clone();
                let items = self.state.items().to_vec();
                tokio::spawn(async move {
                    let outcome = gateway.clear_completed(owner.as_ref(), &items).await;
                    let _ = done.send(outcome);
                });
            }
        }
    }

    fn publish(&self) {
        let next = self.state.view();
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

fn alert_if_signed_out<T>(alerts: &broadcast::Sender<String>, result: &SyncResult<T>) {
    if let Err(SyncError::NotAuthenticated) = result {
        let _ = alerts.send(SyncError::NotAuthenticated.to_string());
    }
}

/// Cloneable front door to a running `ShoppingListActor`
#[derive(Clone)]
pub struct ShoppingListHandle {
    commands: mpsc::UnboundedSender<ListCommand>,
    view: watch::Receiver<ListView>,
    alerts: broadcast::Sender<String>,
}

impl ShoppingListHandle {
    /// Latest published view
    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<ListView> {
        self.view.clone()
    }

    pub fn alerts(&self) -> broadcast::Receiver<String> {
        self.alerts.subscribe()
    }

    pub async fn sign_in(&self, provider: ProviderKind) -> SyncResult<Identity> {
        self.request(|reply| ListCommand::SignIn { provider, reply })
            .await
            .unwrap_or_else(|| Err(stopped()))
    }

    pub async fn sign_out(&self) -> SyncResult<()> {
        self.request(|reply| ListCommand::SignOut { reply })
            .await
            .unwrap_or_else(|| Err(stopped()))
    }

    pub async fn add_item(&self, name: impl Into<String>, store: impl Into<String>) -> SyncResult<ItemId> {
        let (name, store) = (name.into(), store.into());
        self.request(|reply| ListCommand::AddItem { name, store, reply })
            .await
            .unwrap_or_else(|| Err(stopped()))
    }

    pub async fn add_item_to_store(&self, store: impl Into<String>) -> SyncResult<ItemId> {
        let store = store.into();
        self.request(|reply| ListCommand::AddItemToStore { store, reply })
            .await
            .unwrap_or_else(|| Err(stopped()))
    }

    pub fn set_draft(&self, store: impl Into<String>, text: impl Into<String>) {
        let _ = self.commands.send(ListCommand::SetDraft {
            store: store.into(),
            text: text.into(),
        });
    }

    /// Resolves once the store has answered; the view follows on redelivery
    pub async fn toggle_item(&self, id: ItemId, completed: bool) {
        self.request(|done| ListCommand::ToggleItem { id, completed, done }).await;
    }

    pub async fn delete_item(&self, id: ItemId) {
        self.request(|done| ListCommand::DeleteItem { id, done }).await;
    }

    pub async fn clear_completed(&self) -> ClearOutcome {
        self.request(|done| ListCommand::ClearCompleted { done })
            .await
            .unwrap_or_default()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> ListCommand) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(build(tx)).ok()?;
        rx.await.ok()
    }
}

fn stopped() -> SyncError {
    SyncError::Backend("shopping list is not running".to_string())
}
