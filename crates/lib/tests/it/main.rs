/*! Integration tests for boardsync.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * - server: REST surface and error mapping against a live server
 * - realtime: websocket rooms and event fan-out between clients
 * - moves: optimistic moves through `MoveCoordinator` backed by `HttpClient`
 * - convergence: views fed only by events end up equal to a fresh fetch
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("boardsync=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod convergence;
mod helpers;
mod moves;
mod realtime;
mod server;
