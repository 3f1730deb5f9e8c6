//! App controller: navigation shell plus effect executor.
//!
//! # Responsibility
//! - Own the connection, change feed, session and navigation stack.
//! - Route UI events to the active screen and execute the returned effects
//!   against the identity collaborator and the note repository.
//!
//! # Invariants
//! - Every collaborator failure ends up as a dialog; nothing is retried.
//! - The Home screen exists exactly while `Route::Home` is on top.
//! - Note writes only touch notes owned by the signed-in user.
//! - At most one delete confirmation is open.
//! - After an own mutation the list is reloaded and pending subscription
//!   events are drained, so the screen is sequenced after its own writes.

use crate::config::{AppConfig, ConfigError};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::identity::{Argon2Hasher, IdentityProvider, Session, SqliteIdentity};
use crate::model::note::{NoteDraft, NoteId, OwnerId};
use crate::model::user::UserHandle;
use crate::repo::note_repo::{
    DocumentNoteRepository, NoteRepository, NotesSubscription, RepoError,
};
use crate::screens::auth::{AuthFailure, LoginMsg, LoginScreen, RegisterMsg, RegisterScreen};
use crate::screens::navigation::{Navigator, Route};
use crate::screens::notes::{NotesMsg, NotesScreen};
use crate::screens::{Dialog, DialogKind, Effect, NavAction};
use crate::store::{ChangeFeed, SqliteDocumentStore};
use log::{error, info, warn};
use rusqlite::Connection;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

pub type AppResult<T> = Result<T, AppError>;

/// Failure while building the app. Runtime failures become dialogs instead.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Db(DbError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// User intent addressed to one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Login(LoginMsg),
    Register(RegisterMsg),
    Notes(NotesMsg),
    /// Closes the oldest open dialog.
    DismissDialog,
}

struct HomeSession {
    owner: UserHandle,
    screen: NotesScreen,
    subscription: NotesSubscription,
}

pub struct App {
    conn: Connection,
    feed: ChangeFeed,
    session: Session,
    hasher: Argon2Hasher,
    navigator: Navigator,
    login: LoginScreen,
    register: RegisterScreen,
    home: Option<HomeSession>,
    dialogs: VecDeque<Dialog>,
}

impl App {
    /// Opens the configured database and builds the app on it.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let conn = match &config.database.path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Self::with_connection(conn, config)
    }

    /// Builds the app on an already migrated connection.
    pub fn with_connection(conn: Connection, config: &AppConfig) -> AppResult<Self> {
        let hasher = Argon2Hasher::new(config.hasher.to_params()?);
        info!("event=app_open module=app status=ok");
        Ok(Self {
            conn,
            feed: ChangeFeed::new(config.live_query.channel_capacity),
            session: Session::new(),
            hasher,
            navigator: Navigator::new(),
            login: LoginScreen::default(),
            register: RegisterScreen::default(),
            home: None,
            dialogs: VecDeque::new(),
        })
    }

    pub fn route(&self) -> &Route {
        self.navigator.current()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn login_screen(&self) -> &LoginScreen {
        &self.login
    }

    pub fn register_screen(&self) -> &RegisterScreen {
        &self.register
    }

    /// Home screen state while `Route::Home` is active.
    pub fn notes_screen(&self) -> Option<&NotesScreen> {
        self.home.as_ref().map(|home| &home.screen)
    }

    /// Open dialogs, oldest first.
    pub fn dialogs(&self) -> impl Iterator<Item = &Dialog> {
        self.dialogs.iter()
    }

    pub fn take_dialogs(&mut self) -> Vec<Dialog> {
        self.dialogs.drain(..).collect()
    }

    pub fn current_user(&self) -> Option<UserHandle> {
        self.session.current()
    }

    pub fn watch_current_user(&self) -> watch::Receiver<Option<UserHandle>> {
        self.session.watch()
    }

    /// Note repository sharing this app's connection and change feed.
    pub fn notes_repository(&self) -> DocumentNoteRepository<SqliteDocumentStore<'_>> {
        DocumentNoteRepository::new(SqliteDocumentStore::new(&self.conn, self.feed.clone()))
    }

    /// Identity collaborator sharing this app's session.
    pub fn identity(&self) -> SqliteIdentity<'_, Argon2Hasher> {
        SqliteIdentity::new(&self.conn, &self.hasher, self.session.clone())
    }

    /// Runs one UI event and every follow-up it causes.
    pub fn dispatch(&mut self, event: UiEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let effects = self.update_screen(event);
            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    /// Applies remote changes seen by the live subscription.
    ///
    /// Returns `true` when the list was reloaded.
    pub fn pump_subscription(&mut self) -> bool {
        let changed = self
            .home
            .as_mut()
            .is_some_and(|home| home.subscription.poll_changed());
        if changed {
            self.reload_notes();
        }
        changed
    }

    /// Waits for the next relevant change and reloads.
    ///
    /// Returns `false` when no Home screen is active.
    pub async fn wait_for_change(&mut self) -> bool {
        let Some(home) = self.home.as_mut() else {
            return false;
        };
        if !home.subscription.changed().await {
            return false;
        }
        // The awaited event is consumed; drain whatever queued behind it.
        home.subscription.poll_changed();
        self.reload_notes();
        true
    }

    fn reload_notes(&mut self) {
        let search = self
            .home
            .as_ref()
            .map(|home| home.screen.search.clone())
            .unwrap_or_default();
        self.dispatch_effects(vec![Effect::LoadNotes { search }]);
    }

    fn dispatch_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Some(follow_up) = self.run_effect(effect) {
                self.dispatch(follow_up);
            }
        }
    }

    fn update_screen(&mut self, event: UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::Login(msg) => self.login.update(msg),
            UiEvent::Register(msg) => self.register.update(msg),
            UiEvent::Notes(msg) => {
                if matches!(msg, NotesMsg::ConfirmDelete | NotesMsg::CancelDelete) {
                    self.close_confirm_dialog();
                }
                match self.home.as_mut() {
                    Some(home) => home.screen.update(msg),
                    None => {
                        warn!("event=ui_dispatch module=app status=ignored reason=no_home_screen");
                        Vec::new()
                    }
                }
            }
            UiEvent::DismissDialog => {
                let confirm_in_front = self
                    .dialogs
                    .front()
                    .is_some_and(|dialog| matches!(dialog.kind, DialogKind::Confirm { .. }));
                if confirm_in_front {
                    // Dismissing the delete prompt is a cancel.
                    return self.update_screen(UiEvent::Notes(NotesMsg::CancelDelete));
                }
                self.dialogs.pop_front();
                Vec::new()
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) -> Option<UiEvent> {
        match effect {
            Effect::Login { email, password } => {
                let result = self.identity().login(&email, &password);
                Some(UiEvent::Login(match result {
                    Ok(user) => LoginMsg::Succeeded(user),
                    Err(err) => LoginMsg::Failed(AuthFailure::from(&err)),
                }))
            }
            Effect::Register { email, password } => {
                let result = self.identity().register(&email, &password);
                Some(UiEvent::Register(match result {
                    Ok(user) => RegisterMsg::Succeeded(user),
                    Err(err) => RegisterMsg::Failed(AuthFailure::from(&err)),
                }))
            }
            Effect::Logout => {
                self.identity().logout();
                self.login = LoginScreen::default();
                self.navigate(NavAction::Replace(Route::Login))
            }
            Effect::LoadNotes { search } => {
                let owner = self.home.as_ref()?.owner.uid;
                let result = self.notes_repository().search_for_owner(owner, &search);
                if let Some(home) = self.home.as_mut() {
                    // This load already reflects everything queued so far.
                    home.subscription.poll_changed();
                }
                Some(UiEvent::Notes(match result {
                    Ok(notes) => NotesMsg::NotesLoaded(notes),
                    Err(err) => NotesMsg::LoadFailed(err.to_string()),
                }))
            }
            Effect::AddNote { title, content } => {
                let owner = self.home.as_ref()?.owner.uid;
                let draft = NoteDraft::new(title, content);
                let result = self.notes_repository().add_note(owner, &draft);
                Some(UiEvent::Notes(save_outcome(result.map(|_| ()))))
            }
            Effect::UpdateNote { id, title, content } => {
                let owner = self.home.as_ref()?.owner.uid;
                let draft = NoteDraft::new(title, content);
                let result = self
                    .check_owner(owner, id)
                    .and_then(|()| self.notes_repository().update_note(id, &draft));
                Some(UiEvent::Notes(save_outcome(result)))
            }
            Effect::DeleteNote { id } => {
                let owner = self.home.as_ref()?.owner.uid;
                let result = self
                    .check_owner(owner, id)
                    .and_then(|()| self.notes_repository().delete_note(id));
                Some(UiEvent::Notes(match result {
                    Ok(()) => NotesMsg::DeleteSucceeded,
                    Err(err) => NotesMsg::DeleteFailed(err.to_string()),
                }))
            }
            Effect::ShowDialog(dialog) => {
                if matches!(dialog.kind, DialogKind::Confirm { .. }) {
                    // At most one delete prompt is open at a time.
                    self.close_confirm_dialog();
                }
                self.dialogs.push_back(dialog);
                None
            }
            Effect::Navigate(action) => self.navigate(action),
        }
    }

    fn navigate(&mut self, action: NavAction) -> Option<UiEvent> {
        match action {
            NavAction::Push(route) => self.navigator.navigate(route),
            NavAction::Replace(route) => self.navigator.replace(route),
            NavAction::Back => {
                self.navigator.go_back();
            }
        }
        info!(
            "event=navigate module=app status=ok route={}",
            self.navigator.current().name()
        );
        self.sync_home()
    }

    /// Mounts or drops the Home screen to match the top route.
    fn sync_home(&mut self) -> Option<UiEvent> {
        let Route::Home {
            owner_email,
            owner_id,
        } = self.navigator.current().clone()
        else {
            self.home = None;
            return None;
        };
        if self
            .home
            .as_ref()
            .is_some_and(|home| home.owner.uid == owner_id)
        {
            return None;
        }

        let subscribed = self.notes_repository().subscribe_owner(owner_id);
        match subscribed {
            Ok(subscription) => {
                self.home = Some(HomeSession {
                    screen: NotesScreen::new(owner_email.clone()),
                    owner: UserHandle {
                        uid: owner_id,
                        email: owner_email,
                    },
                    subscription,
                });
                Some(UiEvent::Notes(NotesMsg::Mounted))
            }
            Err(err) => {
                error!("event=home_mount module=app status=error error={err}");
                self.home = None;
                self.dialogs
                    .push_back(Dialog::alert("Error", "Failed to load notes"));
                None
            }
        }
    }

    /// Rejects writes to a note held by another owner. A missing note passes;
    /// the repository decides what that means for the write.
    fn check_owner(&self, owner: OwnerId, id: NoteId) -> Result<(), RepoError> {
        match self.notes_repository().get_note(id)? {
            Some(note) if note.owner_id != owner => {
                warn!("event=note_access module=app status=rejected reason=foreign_owner");
                Err(RepoError::NotFound(id))
            }
            _ => Ok(()),
        }
    }

    fn close_confirm_dialog(&mut self) {
        self.dialogs
            .retain(|dialog| !matches!(dialog.kind, DialogKind::Confirm { .. }));
    }
}

fn save_outcome(result: Result<(), RepoError>) -> NotesMsg {
    match result {
        Ok(()) => NotesMsg::SaveSucceeded,
        Err(err) => NotesMsg::SaveFailed(err.to_string()),
    }
}
