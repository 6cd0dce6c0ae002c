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

//! Error taxonomy for the whole crate: cryptographic, protocol,
//! session and resource errors, unified under a single top-level
//! [`Error`].

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("AEAD operation failed")]
    AeadFailed,
    #[error("algorithm '{declared}' does not match key type '{actual}'")]
    AlgorithmMismatch { declared: String, actual: String },
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown signer for did '{0}'")]
    UnknownSigner(String),
    #[error("bad handshake commitment: {0}")]
    BadCommitment(String),
    #[error("timestamp outside allowed clock skew")]
    TimestampSkew,
    #[error("nonce replay detected for context '{0}'")]
    NonceReplay(String),
    #[error("recomputed info does not match payload")]
    InfoMismatch,
    #[error("recomputed export context does not match payload")]
    ExportCtxMismatch,
    #[error("ack tag does not match")]
    AckMismatch,
    #[error("a cookie is required but was not presented")]
    CookieRequired,
    #[error("cookie verification failed")]
    CookieInvalid,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session expired")]
    Expired,
    #[error("message out of order: seq {seq} <= last {last}")]
    OutOfOrder { seq: u64, last: u64 },
    #[error("duplicate message")]
    Duplicate,
    #[error("session is closed")]
    Closed,
    #[error("kid '{0}' is already bound to a different session")]
    KidAlreadyBound(String),
    #[error("unknown kid '{0}'")]
    UnknownKid(String),
    #[error("unknown sid '{0}'")]
    UnknownSid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("not found")]
    NotFound,
    #[error("resolver backend error: {0}")]
    Backend(String),
    #[error("internal error: {0}")]
    Internal(String),
}
