// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Registry of live sessions.
//!
//! Each session sits behind its own mutex so operations on one session are
//! serialized while different sessions proceed independently. Every mutating
//! operation writes the session back to the store before returning. The map
//! lock is only held to look up, insert or remove entries.

use crate::error::{GameError, GameResult};
use crate::messages::{
    CeremonyView, CheckpointView, GameStateView, Joined, MoveAccepted, ShareResponse,
};
use crate::player::PlayerId;
use crate::repo::SessionRepositoryFactory;
use crate::session::{GameSession, SessionId};
use petname::Petnames;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, instrument, warn};
use umbra_config::AppConfig;
use umbra_data::{DataStore, Repositories, RepositoriesFactory, SledStore, DEFAULT_TREE};
use umbra_fhe::{create_context, CryptoContext, JointPublicKey, KeyEpoch, SchemeParameters};

type SharedSession = Arc<Mutex<GameSession>>;

pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    repositories: Repositories,
    // Serializes read-modify-write cycles on the stored session index.
    index_lock: Mutex<()>,
    scheme: SchemeParameters,
    max_stages: u64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("preset", &self.scheme.preset)
            .field("max_stages", &self.max_stages)
            .finish_non_exhaustive()
    }
}

fn random_session_name() -> String {
    let petnames = Petnames::default();
    let adjectives = &petnames.adjectives;
    let nouns = &petnames.nouns;
    let roll: u64 = rand::random();
    let adj_idx = (roll % adjectives.len() as u64) as usize;
    let noun_idx = ((roll / adjectives.len() as u64) % nouns.len() as u64) as usize;
    format!("{}-{}-{:04x}", adjectives[adj_idx], nouns[noun_idx], roll >> 48)
}

impl SessionManager {
    pub fn new(store: DataStore, scheme: SchemeParameters, max_stages: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            repositories: store.repositories(),
            index_lock: Mutex::new(()),
            scheme,
            max_stages,
        }
    }

    /// Builds a manager over the store the config selects.
    pub fn from_config(config: &AppConfig) -> GameResult<Self> {
        let store: DataStore = if config.use_in_mem_store() {
            DataStore::in_mem()
        } else {
            SledStore::new(&config.db_file(), DEFAULT_TREE)?.into()
        };
        Ok(Self::new(
            store,
            config.scheme_parameters(),
            config.max_stages(),
        ))
    }

    pub fn max_stages(&self) -> u64 {
        self.max_stages
    }

    pub fn session_ids(&self) -> GameResult<Vec<SessionId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GameError::LockPoisoned("sessions"))?;
        let mut ids: Vec<_> = sessions.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn session(&self, id: &SessionId) -> GameResult<SharedSession> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GameError::LockPoisoned("sessions"))?;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownSession(id.clone()))
    }

    fn read_session<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&GameSession) -> GameResult<T>,
    ) -> GameResult<T> {
        let session = self.session(id)?;
        let guard = session
            .lock()
            .map_err(|_| GameError::LockPoisoned("session"))?;
        f(&guard)
    }

    /// Runs `f` against the session and persists the result. The session is
    /// written back even when `f` fails, since an aborted ceremony still
    /// advances the key epoch.
    fn mutate_session<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut GameSession) -> GameResult<T>,
    ) -> GameResult<T> {
        let session = self.session(id)?;
        let mut guard = session
            .lock()
            .map_err(|_| GameError::LockPoisoned("session"))?;
        let result = f(&mut guard);
        if let Err(err) = self.persist(&guard) {
            if result.is_ok() {
                return Err(err);
            }
            warn!(session = %id, error = %err, "could not persist session");
        }
        result
    }

    fn persist(&self, session: &GameSession) -> GameResult<()> {
        let id = session.id();
        self.repositories.session(id).write(&session.snapshot()?)?;
        let joint = self.repositories.joint_public_key(id);
        match session.joint_key_json()? {
            Some(json) => joint.write(&json)?,
            None => joint.clear()?,
        }
        self.repositories.store.flush()?;
        Ok(())
    }

    fn update_index(&self, f: impl FnOnce(&mut Vec<SessionId>)) -> GameResult<()> {
        let _guard = self
            .index_lock
            .lock()
            .map_err(|_| GameError::LockPoisoned("session index"))?;
        let index = self.repositories.session_index();
        let mut ids = index.read()?.unwrap_or_default();
        f(&mut ids);
        index.write(&ids)?;
        Ok(())
    }

    /// Creates a session under a generated name.
    pub fn create_session(&self) -> GameResult<SessionId> {
        self.create_session_with_id(SessionId::new(random_session_name()))
    }

    /// Creates a session with its own crypto context. Every session draws a
    /// fresh common random polynomial so artifacts never cross sessions.
    #[instrument(skip_all, fields(session = %id))]
    pub fn create_session_with_id(&self, id: SessionId) -> GameResult<SessionId> {
        if self
            .sessions
            .read()
            .map_err(|_| GameError::LockPoisoned("sessions"))?
            .contains_key(&id)
        {
            return Err(GameError::SessionExists(id));
        }

        let scheme = self.scheme.clone().with_seed(rand::random::<[u8; 32]>());
        let ctx = create_context(&scheme)?;
        let context_json = ctx.to_json()?;
        let session: SharedSession = Arc::new(Mutex::new(GameSession::new(
            id.clone(),
            ctx,
            self.max_stages,
        )));

        // Callers that find the entry wait on this guard until it is stored.
        let guard = session
            .lock()
            .map_err(|_| GameError::LockPoisoned("session"))?;
        {
            let mut sessions = self
                .sessions
                .write()
                .map_err(|_| GameError::LockPoisoned("sessions"))?;
            if sessions.contains_key(&id) {
                return Err(GameError::SessionExists(id));
            }
            sessions.insert(id.clone(), Arc::clone(&session));
        }

        if let Err(err) = self.store_new_session(&guard, context_json) {
            drop(guard);
            self.sessions
                .write()
                .map_err(|_| GameError::LockPoisoned("sessions"))?
                .remove(&id);
            return Err(err);
        }
        info!(max_stages = self.max_stages, "session created");
        Ok(id)
    }

    fn store_new_session(&self, session: &GameSession, context_json: String) -> GameResult<()> {
        let id = session.id();
        self.repositories.context(id).write(&context_json)?;
        self.persist(session)?;
        self.update_index(|ids| {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        })
    }

    #[instrument(skip_all, fields(session = %session))]
    pub fn join(&self, session: &SessionId, player: impl Into<PlayerId>) -> GameResult<Joined> {
        let player = player.into();
        self.mutate_session(session, |s| s.join(player))
    }

    #[instrument(skip_all, fields(session = %session, player = %player))]
    pub fn submit_key_contribution(
        &self,
        session: &SessionId,
        player: &PlayerId,
        serialized: &str,
    ) -> GameResult<()> {
        self.mutate_session(session, |s| s.submit_key_contribution(player, serialized))
    }

    #[instrument(skip_all, fields(session = %session, player = %player))]
    pub fn submit_joint_key(
        &self,
        session: &SessionId,
        player: &PlayerId,
        serialized: &str,
    ) -> GameResult<()> {
        self.mutate_session(session, |s| s.submit_joint_key(player, serialized))
    }

    #[instrument(skip_all, fields(session = %session, player = %player))]
    pub fn submit_move(
        &self,
        session: &SessionId,
        player: &PlayerId,
        serialized: &str,
    ) -> GameResult<MoveAccepted> {
        self.mutate_session(session, |s| s.submit_move(player, serialized))
    }

    #[instrument(skip_all, fields(session = %session, player = %player))]
    pub fn submit_decryption_share(
        &self,
        session: &SessionId,
        player: &PlayerId,
        serialized: &str,
    ) -> GameResult<ShareResponse> {
        self.mutate_session(session, |s| s.submit_decryption_share(player, serialized))
    }

    #[instrument(skip_all, fields(session = %session))]
    pub fn restart_ceremony(&self, session: &SessionId) -> GameResult<KeyEpoch> {
        self.mutate_session(session, |s| s.restart_ceremony())
    }

    pub fn state(&self, session: &SessionId) -> GameResult<GameStateView> {
        self.read_session(session, |s| Ok(s.state()))
    }

    pub fn context_json(&self, session: &SessionId) -> GameResult<String> {
        self.read_session(session, |s| s.context_json())
    }

    pub fn joint_key_json(&self, session: &SessionId) -> GameResult<Option<String>> {
        self.read_session(session, |s| s.joint_key_json())
    }

    /// Context envelope as raw bytes, for transports that ship binary bodies.
    pub fn context_bytes(&self, session: &SessionId) -> GameResult<Vec<u8>> {
        Ok(self.context_json(session)?.into_bytes())
    }

    pub fn joint_key_bytes(&self, session: &SessionId) -> GameResult<Option<Vec<u8>>> {
        Ok(self.joint_key_json(session)?.map(String::into_bytes))
    }

    pub fn ceremony(&self, session: &SessionId) -> GameResult<CeremonyView> {
        self.read_session(session, |s| s.ceremony_view())
    }

    pub fn checkpoint(&self, session: &SessionId) -> GameResult<CheckpointView> {
        self.read_session(session, |s| s.checkpoint())
    }

    /// Reloads one session from the store, replacing any live copy.
    #[instrument(skip_all, fields(session = %id))]
    pub fn restore(&self, id: &SessionId) -> GameResult<()> {
        let Some(context) = self.repositories.context(id).read()? else {
            return Err(GameError::UnknownSession(id.clone()));
        };
        let Some(snapshot) = self.repositories.session(id).read()? else {
            return Err(GameError::UnknownSession(id.clone()));
        };
        let ctx = CryptoContext::from_json(&context)?;
        let joint = self
            .repositories
            .joint_public_key(id)
            .read()?
            .map(|json| JointPublicKey::from_json(&ctx, &json))
            .transpose()?;
        let session = GameSession::restore(ctx, joint, snapshot)?;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GameError::LockPoisoned("sessions"))?;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    /// Reloads every session listed in the store's index. Sessions that fail
    /// to load are logged and skipped; the ids that did load are returned.
    pub fn restore_all(&self) -> GameResult<Vec<SessionId>> {
        let ids = self
            .repositories
            .session_index()
            .read()?
            .unwrap_or_default();
        let mut restored = Vec::with_capacity(ids.len());
        for id in ids {
            match self.restore(&id) {
                Ok(()) => restored.push(id),
                Err(err) => warn!(session = %id, error = %err, "could not restore session"),
            }
        }
        info!(count = restored.len(), "sessions restored");
        Ok(restored)
    }

    /// Drops a session from memory and from the store.
    #[instrument(skip_all, fields(session = %id))]
    pub fn abandon(&self, id: &SessionId) -> GameResult<()> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| GameError::LockPoisoned("sessions"))?
            .remove(id);
        let Some(session) = removed else {
            return Err(GameError::UnknownSession(id.clone()));
        };
        // Wait out any operation still writing this session back.
        let _guard = session
            .lock()
            .map_err(|_| GameError::LockPoisoned("session"))?;
        self.repositories.session(id).clear()?;
        self.repositories.joint_public_key(id).clear()?;
        self.repositories.context(id).clear()?;
        self.update_index(|ids| ids.retain(|i| i != id))?;
        info!("session abandoned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use umbra_fhe::GamePreset;

    fn manager(store: DataStore) -> SessionManager {
        SessionManager::new(
            store,
            SchemeParameters::from_preset(GamePreset::InsecureGame512),
            3,
        )
    }

    #[test]
    fn concurrent_creation_keeps_every_session_indexed() -> GameResult<()> {
        let store = DataStore::in_mem();
        let first = manager(store.clone());
        let results: Vec<GameResult<SessionId>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..12)
                .map(|i| {
                    let first = &first;
                    let id = match i % 3 {
                        0 => SessionId::new("contested"),
                        _ => SessionId::new(format!("table-{i}")),
                    };
                    scope.spawn(move || first.create_session_with_id(id))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("creator thread panicked"))
                .collect()
        });

        let contested: Vec<_> = results
            .iter()
            .filter(|r| !matches!(r, Ok(id) if id.as_str() != "contested"))
            .collect();
        assert_eq!(contested.len(), 4);
        assert_eq!(contested.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(contested
            .iter()
            .all(|r| matches!(r, Ok(_) | Err(GameError::SessionExists(_)))));

        let mut expected = first.session_ids()?;
        assert_eq!(expected.len(), 9);
        let second = manager(store);
        let mut restored = second.restore_all()?;
        restored.sort();
        expected.sort();
        assert_eq!(restored, expected);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn restore_all_skips_sessions_that_fail_to_load() -> GameResult<()> {
        let store = DataStore::in_mem();
        let first = manager(store.clone());
        let good = first.create_session_with_id(SessionId::new("good"))?;
        let broken = first.create_session_with_id(SessionId::new("broken"))?;
        first
            .repositories
            .context(&broken)
            .write(&"not an envelope".to_string())?;
        first.update_index(|ids| ids.push(SessionId::new("missing")))?;

        let second = manager(store);
        assert_eq!(second.restore_all()?, vec![good.clone()]);
        assert_eq!(second.session_ids()?, vec![good]);
        assert!(logs_contain("could not restore session"));
        Ok(())
    }
}
