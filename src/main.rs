/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use gambit::{Config, Session};

fn main() {
    env_logger::init();

    let config = Config::parse();
    log::debug!("Starting with {config:?}");

    let result = Session::new(config).and_then(|mut session| session.run());

    if let Err(e) = result {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
        std::process::exit(1);
    }
}
