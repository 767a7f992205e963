// Host Networking Helpers

use std::net::TcpListener;

/// Find a free TCP port on the loopback interface.
///
/// Binds port 0 and reads back the kernel-assigned port. The port is
/// released before returning, so a racing process could still claim it;
/// prefer runtime-assigned publishing plus `Container::host_port` when the
/// port only needs to be known after launch.
pub fn find_free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
