/* This file is part of SAGE (https://github.com/sage-x-project/sage)
 *
 * Copyright (C) 2024-2026 SAGE-X-project contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Process-wide session table: `sid -> Session` and `kid -> sid`, plus
//! a background sweeper (spec.md §4.8). The core itself never calls
//! `std::thread` outside this module and the `hpke` commitment sweep —
//! it is the only place the crate runs a loop of its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::JoinHandle;

use crate::config::SessionManagerConfig;
use crate::error::{Result, SessionError};
use crate::session::{Role, Session, SID_LABEL};
use crate::util::now_unix;
use crate::util::secret::Secret32;

#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerStats {
    pub active: usize,
    pub kid_bindings: usize,
    pub oldest_age_secs: u64,
    pub average_age_secs: u64,
}

struct Shared {
    sessions: RwLock<HashMap<String, Mutex<Session>>>,
    kid_to_sid: RwLock<HashMap<String, String>>,
    cfg: SessionManagerConfig,
}

/// Owns all live sessions for a process (or a test). Multiple managers
/// may coexist; nothing here is global (spec.md §9).
pub struct SessionManager {
    shared: Arc<Shared>,
    shutdown_flag: Arc<AtomicBool>,
    shutdown_signal: Arc<(Mutex<bool>, Condvar)>,
    sweeper: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(cfg: SessionManagerConfig) -> Self {
        let shared = Arc::new(Shared {
            sessions: RwLock::new(HashMap::new()),
            kid_to_sid: RwLock::new(HashMap::new()),
            cfg,
        });
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_signal = Arc::new((Mutex::new(false), Condvar::new()));

        let sweeper = if cfg.spawn_sweeper {
            Some(spawn_sweeper(shared.clone(), shutdown_flag.clone(), shutdown_signal.clone()))
        } else {
            None
        };

        Self { shared, shutdown_flag, shutdown_signal, sweeper }
    }

    /// Idempotent: two calls with the same `(seed, label)` derive the
    /// same deterministic `sid` and collapse to the same session
    /// (spec.md §8's determinism invariant).
    pub fn ensure_from_exporter(
        &self,
        seed: &Secret32,
        label: &str,
        role: Role,
    ) -> Result<(String, bool)> {
        let sid = crate::session::derive_sid(label, seed);

        {
            let sessions = self.shared.sessions.read().expect("session map lock poisoned");
            if sessions.contains_key(&sid) {
                return Ok((sid, true));
            }
        }

        let mut sessions = self.shared.sessions.write().expect("session map lock poisoned");
        if sessions.contains_key(&sid) {
            return Ok((sid, true));
        }
        if sessions.len() >= self.shared.cfg.cap {
            return Err(crate::error::ResourceError::Internal("session manager at capacity".into()).into());
        }
        let session = Session::from_seed(seed, label, role, self.shared.cfg.session)?;
        sessions.insert(sid.clone(), Mutex::new(session));
        log::debug!("session manager created sid={sid}");
        Ok((sid, false))
    }

    pub fn bind_kid(&self, kid: &str, sid: &str) -> Result<()> {
        let mut bindings = self.shared.kid_to_sid.write().expect("kid map lock poisoned");
        match bindings.get(kid) {
            Some(existing) if existing != sid => Err(SessionError::KidAlreadyBound(kid.to_string()).into()),
            Some(_) => Ok(()),
            None => {
                bindings.insert(kid.to_string(), sid.to_string());
                Ok(())
            }
        }
    }

    pub fn sid_for_kid(&self, kid: &str) -> Result<String> {
        self.shared
            .kid_to_sid
            .read()
            .expect("kid map lock poisoned")
            .get(kid)
            .cloned()
            .ok_or_else(|| SessionError::UnknownKid(kid.to_string()).into())
    }

    /// Runs `f` with exclusive access to the session bound to `kid`.
    pub fn with_session_by_kid<T>(&self, kid: &str, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let sid = self.sid_for_kid(kid)?;
        self.with_session_by_sid(&sid, f)
    }

    pub fn with_session_by_sid<T>(&self, sid: &str, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let sessions = self.shared.sessions.read().expect("session map lock poisoned");
        let session = sessions
            .get(sid)
            .ok_or_else(|| SessionError::UnknownSid(sid.to_string()))?;
        let mut session = session.lock().expect("session mutex poisoned");
        f(&mut session)
    }

    pub fn remove(&self, sid: &str) {
        let mut sessions = self.shared.sessions.write().expect("session map lock poisoned");
        if let Some(session) = sessions.remove(sid) {
            session.lock().expect("session mutex poisoned").close();
        }
        drop(sessions);
        let mut bindings = self.shared.kid_to_sid.write().expect("kid map lock poisoned");
        bindings.retain(|_, mapped_sid| mapped_sid != sid);
    }

    pub fn shutdown(&self) {
        let mut sessions = self.shared.sessions.write().expect("session map lock poisoned");
        for (_, session) in sessions.drain() {
            session.lock().expect("session mutex poisoned").close();
        }
        self.shared.kid_to_sid.write().expect("kid map lock poisoned").clear();
    }

    pub fn stats(&self) -> ManagerStats {
        let sessions = self.shared.sessions.read().expect("session map lock poisoned");
        stats_from_sessions(&sessions, self.shared.kid_to_sid.read().expect("kid map lock poisoned").len())
    }

    /// Runs one sweep pass synchronously; the background sweeper calls
    /// this on its own timer, but tests and embedders without a
    /// background thread may call it directly.
    pub fn sweep_once(&self) {
        sweep(&self.shared);
    }
}

fn stats_from_sessions(sessions: &HashMap<String, Mutex<Session>>, kid_bindings: usize) -> ManagerStats {
    let now = now_unix();
    let mut oldest = 0u64;
    let mut total = 0u64;
    for session in sessions.values() {
        let session = session.lock().expect("session mutex poisoned");
        let age = now.saturating_sub(session.created_at());
        oldest = oldest.max(age);
        total += age;
    }
    ManagerStats {
        active: sessions.len(),
        kid_bindings,
        oldest_age_secs: oldest,
        average_age_secs: if sessions.is_empty() { 0 } else { total / sessions.len() as u64 },
    }
}

fn spawn_sweeper(
    shared: Arc<Shared>,
    shutdown_flag: Arc<AtomicBool>,
    shutdown_signal: Arc<(Mutex<bool>, Condvar)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let (lock, cvar) = &*shutdown_signal;
        loop {
            let guard = lock.lock().expect("shutdown signal lock poisoned");
            let (guard, timeout_result) = cvar
                .wait_timeout(guard, shared.cfg.sweep_interval)
                .expect("shutdown signal lock poisoned");
            drop(guard);
            if shutdown_flag.load(Ordering::Relaxed) {
                break;
            }
            if timeout_result.timed_out() {
                sweep(&shared);
            }
        }
    })
}

fn sweep(shared: &Arc<Shared>) {
    let now = now_unix();
    let mut sessions = shared.sessions.write().expect("session map lock poisoned");
    let expired: Vec<String> = sessions
        .iter()
        .filter(|(_, s)| s.lock().expect("session mutex poisoned").is_expired(now))
        .map(|(sid, _)| sid.clone())
        .collect();
    for sid in &expired {
        if let Some(session) = sessions.remove(sid) {
            session.lock().expect("session mutex poisoned").close();
        }
    }
    drop(sessions);
    if !expired.is_empty() {
        let mut bindings = shared.kid_to_sid.write().expect("kid map lock poisoned");
        bindings.retain(|_, sid| !expired.contains(sid));
        log::debug!("session manager swept {} expired session(s)", expired.len());
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        let (lock, cvar) = &*self.shutdown_signal;
        let _guard = lock.lock().expect("shutdown signal lock poisoned");
        cvar.notify_all();
        drop(_guard);
        if let Some(handle) = self.sweeper.take() {
            let _ = handle.join();
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionManagerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_sweeper_cfg() -> SessionManagerConfig {
        SessionManagerConfig { spawn_sweeper: false, ..SessionManagerConfig::default() }
    }

    #[test]
    fn ensure_from_exporter_is_idempotent() {
        let manager = SessionManager::new(no_sweeper_cfg());
        let seed = Secret32::new([3u8; 32]);
        let (sid1, existed1) = manager.ensure_from_exporter(&seed, SID_LABEL, Role::Initiator).unwrap();
        let (sid2, existed2) = manager.ensure_from_exporter(&seed, SID_LABEL, Role::Initiator).unwrap();
        assert_eq!(sid1, sid2);
        assert!(!existed1);
        assert!(existed2);
    }

    #[test]
    fn bind_kid_rejects_conflicting_rebind() {
        let manager = SessionManager::new(no_sweeper_cfg());
        let seed_a = Secret32::new([1u8; 32]);
        let seed_b = Secret32::new([2u8; 32]);
        let (sid_a, _) = manager.ensure_from_exporter(&seed_a, SID_LABEL, Role::Initiator).unwrap();
        let (sid_b, _) = manager.ensure_from_exporter(&seed_b, SID_LABEL, Role::Initiator).unwrap();

        manager.bind_kid("kid-1", &sid_a).unwrap();
        manager.bind_kid("kid-1", &sid_a).unwrap(); // idempotent rebind to the same sid
        assert!(manager.bind_kid("kid-1", &sid_b).is_err());
    }

    #[test]
    fn remove_drops_kid_binding() {
        let manager = SessionManager::new(no_sweeper_cfg());
        let seed = Secret32::new([9u8; 32]);
        let (sid, _) = manager.ensure_from_exporter(&seed, SID_LABEL, Role::Initiator).unwrap();
        manager.bind_kid("kid-x", &sid).unwrap();
        manager.remove(&sid);
        assert!(manager.sid_for_kid("kid-x").is_err());
    }

    #[test]
    fn capacity_is_enforced() {
        let cfg = SessionManagerConfig { cap: 1, spawn_sweeper: false, ..SessionManagerConfig::default() };
        let manager = SessionManager::new(cfg);
        manager.ensure_from_exporter(&Secret32::new([1u8; 32]), SID_LABEL, Role::Initiator).unwrap();
        assert!(manager
            .ensure_from_exporter(&Secret32::new([2u8; 32]), SID_LABEL, Role::Initiator)
            .is_err());
    }
}
