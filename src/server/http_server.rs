use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Handle to one running accept loop.
///
/// Stopping is split in two so the lifecycle manager can stop *both*
/// endpoints accepting before it waits on either: [`cancel`](Self::cancel)
/// only signals the loop, [`join`](Self::join) waits for it to finish.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the endpoint accepts TCP connections. Gives up after
    /// ~250ms; mainly useful in tests.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting new connections. Returns immediately; in-flight
    /// requests keep their handling thread until they finish.
    pub fn cancel(&self) {
        // SAFETY: cancelling the accept-loop coroutine is the runtime's
        // intended shutdown path; the handle is owned and still valid here.
        unsafe {
            self.handle.coroutine().cancel();
        }
    }

    /// Wait for the accept loop to finish. Call [`cancel`](Self::cancel)
    /// first, on every endpoint, or this blocks until the process dies.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// Bind `service` on `addr` and start its accept loop.
pub fn start_service<T, A>(service: T, addr: A) -> io::Result<ServerHandle>
where
    T: HttpService + Clone + Send + Sync + 'static,
    A: ToSocketAddrs,
{
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
    let handle = may_minihttp::HttpServer(service).start(addr)?;
    Ok(ServerHandle { addr, handle })
}
