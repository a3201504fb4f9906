//! Console output redirection.

#[cfg(unix)]
use std::io::{self, Write};

/// Redirects process-level stdout to `/dev/null` until dropped.
///
/// Works on the file descriptor, so it also silences child processes and
/// foreign code sharing fd 1, which buffer-level tricks cannot.
#[cfg(unix)]
pub struct SuppressStdout {
    saved: libc::c_int,
}

#[cfg(unix)]
impl SuppressStdout {
    pub fn new() -> io::Result<Self> {
        // Flush Rust-level buffering before swapping the fd underneath it.
        io::stdout().flush()?;

        let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }

        let devnull = unsafe { libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY) };
        if devnull < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved) };
            return Err(err);
        }

        let rc = unsafe { libc::dup2(devnull, libc::STDOUT_FILENO) };
        unsafe { libc::close(devnull) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved) };
            return Err(err);
        }

        Ok(Self { saved })
    }
}

#[cfg(unix)]
impl Drop for SuppressStdout {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        unsafe {
            libc::dup2(self.saved, libc::STDOUT_FILENO);
            libc::close(self.saved);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_and_restore() {
        {
            let _guard = SuppressStdout::new().unwrap();
            println!("this line is swallowed");
        }
        // Restored; writes must succeed again.
        println!("this line is visible");
    }
}
