//! Daemonization for the server binary.
//!
//! Classic double-fork detach: the launcher exits immediately, the
//! intermediate session leader exits after `setsid`, and the surviving
//! process records its own pid, moves to a stable working directory,
//! optionally drops privileges, and loses its stdin. Every failure here is
//! fatal; a half-daemonized server must not serve.

use crate::error::ServiceError;
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

/// Open the log file append-only and point stdout/stderr at it, so both the
/// tracing output and anything external tools print end up in one place.
pub fn open_log_file(path: &Path) -> Result<(), ServiceError> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ServiceError::config(format!("opening log file {} failed: {e}", path.display()))
        })?;
    let fd = file.as_raw_fd();
    unsafe {
        if libc::dup2(fd, libc::STDOUT_FILENO) < 0 || libc::dup2(fd, libc::STDERR_FILENO) < 0 {
            return Err(ServiceError::config(format!(
                "redirecting output to {} failed: {}",
                path.display(),
                io::Error::last_os_error()
            )));
        }
    }
    Ok(())
}

/// Detach from the controlling terminal. On return the caller is the daemon
/// process; the launcher and the intermediate session leader have exited.
pub fn daemonize(user: Option<&str>, pid_file: &Path) -> Result<(), ServiceError> {
    fork_and_exit_parent()?;

    if unsafe { libc::setsid() } < 0 {
        return Err(ServiceError::config(format!(
            "failed to create process group: {}",
            io::Error::last_os_error()
        )));
    }

    unsafe {
        libc::signal(libc::SIGHUP, libc::SIG_IGN);
    }

    // Second fork: the session leader exits so the daemon can never
    // reacquire a controlling terminal.
    fork_and_exit_parent()?;

    write_pid_file(pid_file)?;

    std::env::set_current_dir("/")
        .map_err(|e| ServiceError::config(format!("cannot chdir to /: {e}")))?;

    if let Some(user) = user {
        drop_privileges(user)?;
    }

    redirect_stdin_to_null()
}

fn fork_and_exit_parent() -> Result<(), ServiceError> {
    match unsafe { libc::fork() } {
        -1 => Err(ServiceError::config(format!(
            "fork failed: {}",
            io::Error::last_os_error()
        ))),
        0 => Ok(()),
        _ => unsafe { libc::_exit(0) },
    }
}

/// Record the calling process's own id. In daemon mode this runs after both
/// forks, so the file holds the daemon's pid, not the launcher's.
pub fn write_pid_file(path: &Path) -> Result<(), ServiceError> {
    fs::write(path, format!("{}\n", std::process::id())).map_err(|e| {
        ServiceError::config(format!("cannot write pid file {}: {e}", path.display()))
    })
}

fn drop_privileges(user: &str) -> Result<(), ServiceError> {
    let name = CString::new(user)
        .map_err(|_| ServiceError::config(format!("invalid user name {user:?}")))?;
    let pw = unsafe { libc::getpwnam(name.as_ptr()) };
    if pw.is_null() {
        return Err(ServiceError::config(format!(
            "failed to set uid to {user}: unknown user"
        )));
    }
    let uid = unsafe { (*pw).pw_uid };
    if unsafe { libc::setuid(uid) } < 0 {
        return Err(ServiceError::config(format!(
            "failed to set uid to {user}: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn redirect_stdin_to_null() -> Result<(), ServiceError> {
    let null = fs::File::open("/dev/null")
        .map_err(|e| ServiceError::config(format!("cannot open /dev/null: {e}")))?;
    unsafe {
        if libc::dup2(null.as_raw_fd(), libc::STDIN_FILENO) < 0 {
            return Err(ServiceError::config(format!(
                "cannot redirect stdin: {}",
                io::Error::last_os_error()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_file_records_our_own_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.pid");
        write_pid_file(&path).unwrap();
        let recorded: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(recorded, std::process::id());
    }

    #[test]
    fn unwritable_pid_file_is_a_configuration_error() {
        let err = write_pid_file(Path::new("/nonexistent/dir/test.pid")).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
