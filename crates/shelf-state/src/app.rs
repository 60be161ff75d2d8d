//! Top-level state machine.
//!
//! Owns the catalog, the session storage and the navigation history for one
//! gateway, and reacts to the backend's lifecycle notifications. The shape
//! is Elm-like: every change goes through [`App::update`] or a mutator that
//! returns a [`Task`] whose messages are fed back into `update`.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shelf_backend::{BackendError, BackendEvent, Endpoint, Gateway};
use shelf_model::{CreatorId, FormatId, StatusId, WorkId, WorkTypeId};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogMessage};
use crate::error::StateError;
use crate::navigation::{self, NavigationAction, NavigationState, Page};
use crate::notice::Notice;
use crate::session::{SessionCell, SessionReducer, SessionStorage, StorageKey};
use crate::task::Task;

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug)]
pub enum Message {
    /// A catalog request finished.
    Catalog(CatalogMessage),
    /// The backend pushed a lifecycle notification.
    Backend(BackendEvent),
    /// An open/close request finished. Success is reported separately
    /// through [`Message::Backend`].
    Lifecycle {
        endpoint: Endpoint,
        result: Result<(), BackendError>,
    },
}

/// Which top-level screen is shown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No database is open.
    #[default]
    Disconnected,
    Library,
}

// =============================================================================
// APP
// =============================================================================

pub struct App {
    gateway: Arc<dyn Gateway>,
    events: broadcast::Receiver<BackendEvent>,
    storage: Arc<dyn SessionStorage>,
    catalog: Catalog,
    navigation: SessionReducer<NavigationState, NavigationAction>,
    screen: Screen,
    connection: Option<String>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("screen", &self.screen)
            .field("connection", &self.connection)
            .field("catalog", &self.catalog)
            .field("navigation", self.navigation.state())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create the app for `gateway`. Call [`App::start`] to pick up a
    /// database that is already open.
    pub fn new(gateway: Arc<dyn Gateway>, storage: Arc<dyn SessionStorage>) -> Self {
        let events = gateway.subscribe();
        let navigation = SessionReducer::new(
            SessionCell::for_key(
                Arc::clone(&storage),
                StorageKey::LibraryNavigation,
                NavigationState::default(),
            ),
            navigation::reduce,
        );
        Self {
            catalog: Catalog::new(Arc::clone(&gateway)),
            gateway,
            events,
            storage,
            navigation,
            screen: Screen::Disconnected,
            connection: None,
        }
    }

    /// Load everything if the gateway already has a database open.
    pub fn start(&mut self) -> Task<Message> {
        match self.gateway.database_path() {
            Some(path) => self.connect(path),
            None => Task::none(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn navigation(&self) -> &NavigationState {
        self.navigation.state()
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Identifier of the open database, if any.
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Open a session cell scoped to the current connection.
    pub fn session_cell<T>(&self, key: StorageKey, default: T) -> SessionCell<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        SessionCell::for_key(Arc::clone(&self.storage), key, default)
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Ask the backend to open `path`.
    pub fn open(&self, path: impl Into<PathBuf>) -> Task<Message> {
        let path = path.into();
        self.lifecycle(Endpoint::Open, move |gateway| gateway.open(&path))
    }

    /// Ask the backend to close the open database.
    pub fn close(&self) -> Task<Message> {
        self.lifecycle(Endpoint::Close, |gateway| gateway.close())
    }

    fn lifecycle<F>(&self, endpoint: Endpoint, call: F) -> Task<Message>
    where
        F: FnOnce(&dyn Gateway) -> Result<(), BackendError> + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || call(gateway.as_ref()))
                    .await
                    .unwrap_or_else(|error| {
                        Err(BackendError::Rejected(format!("Backend task failed: {error}")))
                    })
            },
            move |result| Message::Lifecycle { endpoint, result },
        )
    }

    /// Handle every lifecycle notification received since the last call.
    pub fn drain_events(&mut self) -> Task<Message> {
        let mut tasks = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => tasks.push(self.update(Message::Backend(event))),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed backend notifications, resynchronizing");
                    let resync = match self.gateway.database_path() {
                        Some(path) => BackendEvent::Opened(path),
                        None => BackendEvent::Closed,
                    };
                    tasks.push(self.update(Message::Backend(resync)));
                }
            }
        }
        Task::batch(tasks)
    }

    fn connect(&mut self, connection: String) -> Task<Message> {
        info!(%connection, "database opened");
        self.clear_session();
        self.catalog.reset();
        self.connection = Some(connection);
        self.screen = Screen::Library;
        self.catalog.load_all().map(Message::Catalog)
    }

    fn disconnect(&mut self) {
        info!("database closed");
        self.clear_session();
        self.catalog.reset();
        self.connection = None;
        self.screen = Screen::Disconnected;
    }

    fn clear_session(&mut self) {
        self.storage.clear();
        self.navigation.refresh();
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Catalog(message) => self.catalog.update(message).map(Message::Catalog),
            Message::Backend(BackendEvent::Opened(connection)) => self.connect(connection),
            Message::Backend(BackendEvent::Closed) => {
                self.disconnect();
                Task::none()
            }
            Message::Lifecycle { endpoint, result } => {
                match result {
                    Ok(()) => debug!(%endpoint, "lifecycle request finished"),
                    Err(error) => {
                        warn!(%endpoint, %error, "lifecycle request failed");
                        self.catalog
                            .notices_mut()
                            .push(Notice::rejected(endpoint, &error));
                    }
                }
                Task::none()
            }
        }
    }

    /// Run `task` and every task it leads to until nothing is pending.
    /// Futures resolve one at a time, oldest first. Returns the number of
    /// messages handled.
    pub async fn settle(&mut self, task: Task<Message>) -> usize {
        let mut pending: std::collections::VecDeque<_> = task.into_futures().into();
        let mut handled = 0;
        while let Some(future) = pending.pop_front() {
            let message = future.await;
            handled += 1;
            let next = self.update(message);
            pending.extend(next.into_futures());
            pending.extend(self.drain_events().into_futures());
        }
        handled
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    pub fn navigate(&mut self, action: NavigationAction) {
        debug!(?action, "navigate");
        self.navigation.dispatch(action);
    }

    /// Remove a work and purge it from the history.
    pub fn remove_work(&mut self, id: WorkId) -> Result<Task<Message>, StateError> {
        let task = self.catalog.remove_work(id)?;
        self.navigation
            .dispatch(NavigationAction::Remove(Page::Work(id)));
        Ok(task.map(Message::Catalog))
    }

    /// Remove a creator and purge it from the history.
    pub fn remove_creator(&mut self, id: CreatorId) -> Result<Task<Message>, StateError> {
        let task = self.catalog.remove_creator(id)?;
        self.navigation
            .dispatch(NavigationAction::Remove(Page::Creator(id)));
        Ok(task.map(Message::Catalog))
    }

    // =========================================================================
    // TAXONOMY REMOVAL
    // =========================================================================

    fn clear_taxonomy_dependents(&self) {
        for key in StorageKey::taxonomy_dependent() {
            self.storage.remove(key.as_str());
        }
        debug!("cleared taxonomy-dependent session keys");
    }

    /// Remove a status and drop session values that could refer to it.
    pub fn remove_status(&mut self, id: StatusId) -> Result<Task<Message>, StateError> {
        let task = self.catalog.remove_status(id)?;
        self.clear_taxonomy_dependents();
        Ok(task.map(Message::Catalog))
    }

    pub fn remove_type(&mut self, id: WorkTypeId) -> Result<Task<Message>, StateError> {
        let task = self.catalog.remove_type(id)?;
        self.clear_taxonomy_dependents();
        Ok(task.map(Message::Catalog))
    }

    pub fn remove_format(&mut self, id: FormatId) -> Result<Task<Message>, StateError> {
        let task = self.catalog.remove_format(id)?;
        self.clear_taxonomy_dependents();
        Ok(task.map(Message::Catalog))
    }
}
