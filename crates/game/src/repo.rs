// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::session::{SessionId, SessionSnapshot};
use umbra_config::StoreKeys;
use umbra_data::{Repositories, Repository};

pub trait SessionRepositoryFactory {
    /// Wire envelope of the session's crypto context.
    fn context(&self, session: &SessionId) -> Repository<String>;
    /// Wire envelope of the current joint public key.
    fn joint_public_key(&self, session: &SessionId) -> Repository<String>;
    fn session(&self, session: &SessionId) -> Repository<SessionSnapshot>;
    /// Ids of every persisted session.
    fn session_index(&self) -> Repository<Vec<SessionId>>;
}

impl SessionRepositoryFactory for Repositories {
    fn context(&self, session: &SessionId) -> Repository<String> {
        Repository::new(self.store.scope(StoreKeys::context(session.as_str())))
    }

    fn joint_public_key(&self, session: &SessionId) -> Repository<String> {
        Repository::new(
            self.store
                .scope(StoreKeys::joint_public_key(session.as_str())),
        )
    }

    fn session(&self, session: &SessionId) -> Repository<SessionSnapshot> {
        Repository::new(self.store.scope(StoreKeys::session(session.as_str())))
    }

    fn session_index(&self) -> Repository<Vec<SessionId>> {
        Repository::new(self.store.scope(StoreKeys::session_index()))
    }
}
