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

//! A minimal two-agent chat demo: runs the client and server sides of
//! one HPKE handshake in-process, stands up the pair of sessions it
//! produces, and exchanges a few signed, encrypted lines between them.
//! There is no real transport here — the "wire" is just handing bytes
//! from one side's encrypt to the other's decrypt — since sage-core
//! leaves transport to the embedder (see `sage_core::transport`).

use std::process::ExitCode;

use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use structopt::StructOpt;

use sage_core::config::HandshakeConfig;
use sage_core::handshake::{client, server};
use sage_core::keyring::x25519::X25519KeyPair;
use sage_core::keyring::{KeyType, SigningKeyPair};
use sage_core::nonce::NonceStore;
use sage_core::resolver::StaticResolver;
use sage_core::session::{Role, Session, SID_LABEL};

#[derive(Debug, StructOpt)]
#[structopt(name = "sage-chat", about = "Demo: one HPKE handshake, a few chat lines, two sessions")]
struct Args {
    /// Number of lines to exchange after the handshake completes
    #[structopt(short, long, default_value = "3")]
    lines: usize,

    /// Increase verbosity (-v, -vv)
    #[structopt(short, parse(from_occurrences))]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .expect("failed to initialize terminal logger");
}

fn run(args: Args) -> sage_core::Result<()> {
    let client_signing = SigningKeyPair::generate(KeyType::Ed25519)?;
    let server_signing = SigningKeyPair::generate(KeyType::Ed25519)?;
    let server_kem = X25519KeyPair::generate();

    let client_did = "did:sage:demo:alice";
    let server_did = "did:sage:demo:bob";

    let resolver = StaticResolver::new()
        .with_sign_key(client_did, sage_core::keyring::PublicKey::from(&client_signing))
        .with_sign_key(server_did, sage_core::keyring::PublicKey::from(&server_signing));
    let client_nonce_store = NonceStore::default();
    let server_nonce_store = NonceStore::default();
    let handshake_cfg = HandshakeConfig::default();

    info!("client building Init for context 'demo-chat'");
    let (init, init_sig, pending) =
        client::build_init("demo-chat", client_did, server_did, &server_kem.public_bytes(), &client_signing, true)?;

    info!("server processing Init, building Ack");
    let (ack, ack_sig, server_secret) = server::handle_init(
        "demo-chat",
        &init,
        &init_sig,
        None,
        &server_kem,
        &server_signing,
        &resolver,
        &server_nonce_store,
        None,
        &handshake_cfg,
    )?;

    info!("client processing Ack");
    let client_secret = client::handle_ack(pending, &ack, &ack_sig, &resolver, &client_nonce_store)?;

    let mut alice = Session::from_seed(&client_secret, SID_LABEL, Role::Initiator, Default::default())?;
    let mut bob = Session::from_seed(&server_secret, SID_LABEL, Role::Responder, Default::default())?;
    info!("session established, sid={}", alice.sid());

    for n in 0..args.lines {
        let line = format!("hello from alice, line {n}");
        let (seq, ct) = alice.encrypt(line.as_bytes(), None)?;
        let tag = alice.sign_covered(line.as_bytes())?;

        let pt = bob.decrypt(seq, &ct, None)?;
        bob.verify_covered(&pt, &tag)?;
        info!("bob received: {}", String::from_utf8_lossy(&pt));
    }

    alice.close();
    bob.close();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::from_args();
    init_logger(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("sage-chat failed: {e}");
            ExitCode::FAILURE
        }
    }
}
