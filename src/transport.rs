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

//! The transport contract this crate consumes but does not implement
//! (spec.md §6). `payload` is opaque to the transport: whether it is
//! already session-encrypted is a decision made above this layer.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone)]
pub struct SecureMessage {
    pub id: uuid::Uuid,
    pub context_id: String,
    pub task_id: String,
    pub payload: Vec<u8>,
    pub did: String,
    pub signature: Vec<u8>,
    pub metadata: HashMap<String, String>,
    pub role: Role,
}

impl SecureMessage {
    pub fn new(
        context_id: impl Into<String>,
        task_id: impl Into<String>,
        payload: Vec<u8>,
        did: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            context_id: context_id.into(),
            task_id: task_id.into(),
            payload,
            did: did.into(),
            signature: Vec::new(),
            metadata: HashMap::new(),
            role,
        }
    }
}

/// Implemented by the embedder's transport (HTTP, WebSocket, in-memory
/// channel). Synchronous, per spec.md §5: "the only suspension point is
/// the transport boundary, which is outside the core".
pub trait Transport: Send + Sync {
    fn send(&self, message: SecureMessage) -> crate::error::Result<SecureMessage>;
}

#[cfg(feature = "resolver-async")]
#[async_trait::async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, message: SecureMessage) -> crate::error::Result<SecureMessage>;
}
