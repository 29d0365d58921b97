//! Unix pty plumbing.

use crate::{CommandBuilder, Dispatch, ExitStatus, PtySize, BUFSIZE};
use anyhow::{bail, Context};
use filedescriptor::FileDescriptor;
use std::collections::VecDeque;
use std::io;
use std::io::Read;
use std::mem;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::ptr;

/// Passwd lookup for the login path; `user` of `None` means the
/// current uid.
pub(crate) struct PasswdEntry {
    pub name: String,
    pub shell: String,
    pub home: String,
}

pub(crate) fn passwd_entry(user: Option<&str>) -> Option<PasswdEntry> {
    unsafe {
        let pw = match user {
            Some(name) if !name.is_empty() => {
                let cname = std::ffi::CString::new(name).ok()?;
                libc::getpwnam(cname.as_ptr())
            }
            _ => libc::getpwuid(libc::getuid()),
        };
        if pw.is_null() {
            return None;
        }

        let cstr = |p: *const libc::c_char| -> String {
            std::ffi::CStr::from_ptr(p).to_string_lossy().into_owned()
        };

        Some(PasswdEntry {
            name: cstr((*pw).pw_name),
            shell: cstr((*pw).pw_shell),
            home: cstr((*pw).pw_dir),
        })
    }
}

fn cloexec(fd: RawFd) -> anyhow::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags == -1 {
        bail!("fcntl F_GETFD failed: {:?}", io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        bail!("fcntl F_SETFD failed: {:?}", io::Error::last_os_error());
    }
    Ok(())
}

fn openpty(size: PtySize) -> anyhow::Result<(FileDescriptor, FileDescriptor)> {
    let mut master: RawFd = -1;
    let mut slave: RawFd = -1;

    let mut ws = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: size.pixel_width,
        ws_ypixel: size.pixel_height,
    };

    let result = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            ptr::null_mut(),
            ptr::null_mut(),
            &mut ws,
        )
    };
    if result != 0 {
        bail!("openpty failed: {:?}", io::Error::last_os_error());
    }

    let master = unsafe { FileDescriptor::from_raw_fd(master) };
    let slave = unsafe { FileDescriptor::from_raw_fd(slave) };

    cloexec(master.as_raw_fd())?;
    cloexec(slave.as_raw_fd())?;

    Ok((master, slave))
}

/// Child-side setup that must run between fork and exec: default
/// signal dispositions, a fresh session with the slave as controlling
/// tty, and the termios contract (UTF-8 input flag, backspace as the
/// erase character).
fn prepare_child_tty() -> io::Result<()> {
    for signo in &[
        libc::SIGCHLD,
        libc::SIGHUP,
        libc::SIGINT,
        libc::SIGQUIT,
        libc::SIGTERM,
        libc::SIGALRM,
    ] {
        unsafe {
            libc::signal(*signo, libc::SIG_DFL);
        }
    }

    if unsafe { libc::setsid() } == -1 {
        return Err(io::Error::last_os_error());
    }

    // stdin is the slave at this point
    if unsafe { libc::ioctl(0, libc::TIOCSCTTY as _, 0) } == -1 {
        return Err(io::Error::last_os_error());
    }

    unsafe {
        let mut attr: libc::termios = mem::zeroed();
        if libc::tcgetattr(0, &mut attr) == 0 {
            attr.c_cc[libc::VERASE] = 0o10;
            attr.c_iflag |= libc::IUTF8;
            libc::tcsetattr(0, libc::TCSANOW, &attr);
        }
    }

    Ok(())
}

enum Endpoint {
    /// A real pty master.
    Master(FileDescriptor),
    /// Pipe fallback when no terminal can be allocated; window size
    /// and signal injection have nothing to act on.
    Pipes {
        read: FileDescriptor,
        write: FileDescriptor,
    },
}

/// A child process bridged over a pty (or pipe pair), with a write
/// ring between the caller and the kernel.
pub struct Pty {
    endpoint: Option<Endpoint>,
    child: std::process::Child,
    out_buf: VecDeque<u8>,
    in_buf: Box<[u8; BUFSIZE]>,
}

impl Pty {
    /// Allocate a pty, spawn `builder`'s command on the slave side and
    /// hand back the bridge.  The master is non-blocking; child setup
    /// failures (session, controlling tty, exec) surface here rather
    /// than as a dead fd later.
    pub fn spawn(builder: &CommandBuilder, size: PtySize) -> anyhow::Result<Pty> {
        let (master, slave) = openpty(size)?;

        let mut cmd = builder.as_command()?;

        if let Some(user) = builder.login_user() {
            match passwd_entry(Some(user).filter(|u| !u.is_empty())) {
                Some(ent) => {
                    cmd.env("LOGNAME", &ent.name);
                    cmd.env("USER", &ent.name);
                    if std::env::var_os("SHELL").is_none() {
                        cmd.env("SHELL", &ent.shell);
                    }
                    if std::env::var_os("HOME").is_none() {
                        cmd.env("HOME", &ent.home);
                    }
                }
                None => log::warn!("no passwd entry for login user"),
            }
        }

        let slave_fd = slave.as_raw_fd();
        unsafe {
            cmd.stdin(std::process::Stdio::from_raw_fd(dup_for_stdio(slave_fd)?));
            cmd.stdout(std::process::Stdio::from_raw_fd(dup_for_stdio(slave_fd)?));
            cmd.stderr(std::process::Stdio::from_raw_fd(dup_for_stdio(slave_fd)?));
            cmd.pre_exec(prepare_child_tty);
        }

        let child = cmd.spawn().context("spawning child on pty slave")?;
        drop(slave);

        let mut master = master;
        master.set_non_blocking(true)?;

        Ok(Pty {
            endpoint: Some(Endpoint::Master(master)),
            child,
            out_buf: VecDeque::new(),
            in_buf: Box::new([0u8; BUFSIZE]),
        })
    }

    /// Pipe-pair fallback: same bridge interface without a terminal.
    pub fn spawn_piped(builder: &CommandBuilder) -> anyhow::Result<Pty> {
        let mut cmd = builder.as_command()?;
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::null());

        let mut child = cmd.spawn().context("spawning piped child")?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let stdin = child.stdin.take().expect("stdin was piped");

        let mut read = unsafe { FileDescriptor::from_raw_fd(into_raw(stdout)) };
        let mut write = unsafe { FileDescriptor::from_raw_fd(into_raw(stdin)) };
        read.set_non_blocking(true)?;
        write.set_non_blocking(true)?;

        Ok(Pty {
            endpoint: Some(Endpoint::Pipes { read, write }),
            child,
            out_buf: VecDeque::new(),
            in_buf: Box::new([0u8; BUFSIZE]),
        })
    }

    pub fn is_open(&self) -> bool {
        self.endpoint.is_some()
    }

    /// The fd to poll for readability.
    pub fn as_raw_fd(&self) -> Option<RawFd> {
        match &self.endpoint {
            Some(Endpoint::Master(fd)) => Some(fd.as_raw_fd()),
            Some(Endpoint::Pipes { read, .. }) => Some(read.as_raw_fd()),
            None => None,
        }
    }

    pub fn child_pid(&self) -> u32 {
        self.child.id()
    }

    /// Close the bridge.  Safe to call more than once; the child keeps
    /// running and should be reaped via [`Pty::try_wait`].
    pub fn close(&mut self) {
        self.endpoint.take();
        self.out_buf.clear();
    }

    /// Update the kernel's idea of the window size, which also sends
    /// SIGWINCH to the foreground process group.  No-op in pipe mode.
    pub fn resize(&mut self, size: PtySize) -> anyhow::Result<()> {
        let fd = match &self.endpoint {
            Some(Endpoint::Master(fd)) => fd.as_raw_fd(),
            Some(Endpoint::Pipes { .. }) => return Ok(()),
            None => bail!("pty is closed"),
        };

        let ws = libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        };

        if unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &ws as *const _) } != 0 {
            bail!("TIOCSWINSZ failed: {:?}", io::Error::last_os_error());
        }
        Ok(())
    }

    /// Inject a signal into the child session.  Uses TIOCSIG so the
    /// whole foreground job receives it, with a plain kill fallback.
    /// No-op in pipe mode.
    pub fn signal(&mut self, sig: i32) -> anyhow::Result<()> {
        let fd = match &self.endpoint {
            Some(Endpoint::Master(fd)) => fd.as_raw_fd(),
            Some(Endpoint::Pipes { .. }) => return Ok(()),
            None => bail!("pty is closed"),
        };

        #[cfg(target_os = "linux")]
        {
            if unsafe { libc::ioctl(fd, libc::TIOCSIG, sig as libc::c_long) } == 0 {
                return Ok(());
            }
        }
        let _ = fd;

        if unsafe { libc::kill(self.child.id() as libc::pid_t, sig) } != 0 {
            bail!("kill failed: {:?}", io::Error::last_os_error());
        }
        Ok(())
    }

    /// Queue bytes for the child.  Data sits in the ring until the fd
    /// accepts it; call [`Pty::flush_writes`] or [`Pty::dispatch`] to
    /// push it out.
    pub fn write(&mut self, data: &[u8]) {
        self.out_buf.extend(data);
    }

    pub fn pending_writes(&self) -> usize {
        self.out_buf.len()
    }

    fn write_fd(&mut self) -> Option<&mut FileDescriptor> {
        match self.endpoint.as_mut() {
            Some(Endpoint::Master(fd)) => Some(fd),
            Some(Endpoint::Pipes { write, .. }) => Some(write),
            None => None,
        }
    }

    /// Push ring contents at the kernel.  Edge-triggered discipline:
    /// try twice, and report `MorePending` when data remains so the
    /// caller reschedules instead of waiting for an edge that already
    /// passed.
    pub fn flush_writes(&mut self) -> io::Result<Dispatch> {
        for _ in 0..2 {
            if self.out_buf.is_empty() {
                return Ok(Dispatch::Drained);
            }

            let (front, back) = self.out_buf.as_slices();
            let iov = [
                libc::iovec {
                    iov_base: front.as_ptr() as *mut _,
                    iov_len: front.len(),
                },
                libc::iovec {
                    iov_base: back.as_ptr() as *mut _,
                    iov_len: back.len(),
                },
            ];
            let iovcnt = if back.is_empty() { 1 } else { 2 };

            let fd = match self.write_fd() {
                Some(fd) => fd.as_raw_fd(),
                None => return Err(io::Error::from(io::ErrorKind::NotConnected)),
            };

            let n = unsafe { libc::writev(fd, iov.as_ptr(), iovcnt) };
            if n < 0 {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EAGAIN) => return Ok(Dispatch::Drained),
                    Some(libc::EINTR) => return Ok(Dispatch::MorePending),
                    _ => return Err(err),
                }
            } else if n == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            } else {
                self.out_buf.drain(..n as usize);
            }
        }

        if self.out_buf.is_empty() {
            Ok(Dispatch::Drained)
        } else {
            Ok(Dispatch::MorePending)
        }
    }

    /// Drain pending reads into `sink`, then pending writes.  Reads
    /// loop twice; if the second read still produced data the kernel
    /// queue is probably not empty and the caller gets `MorePending`.
    ///
    /// EOF and EIO report as `BrokenPipe`: the slave side is gone.
    pub fn dispatch(&mut self, sink: &mut dyn FnMut(&[u8])) -> io::Result<Dispatch> {
        let mut result = Dispatch::Drained;

        for attempt in 0..2 {
            let fd = match &mut self.endpoint {
                Some(Endpoint::Master(fd)) => fd,
                Some(Endpoint::Pipes { read, .. }) => read,
                None => return Err(io::Error::from(io::ErrorKind::NotConnected)),
            };

            match fd.read(&mut self.in_buf[..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::BrokenPipe)),
                Ok(len) => {
                    sink(&self.in_buf[..len]);
                    if attempt == 1 {
                        result = Dispatch::MorePending;
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    result = Dispatch::MorePending;
                    break;
                }
                Err(ref e) if e.raw_os_error() == Some(libc::EIO) => {
                    // EIO from a pty master means the slave closed
                    return Err(io::Error::from(io::ErrorKind::BrokenPipe));
                }
                Err(e) => return Err(e),
            }
        }

        match self.flush_writes() {
            Ok(Dispatch::MorePending) => Ok(Dispatch::MorePending),
            Ok(Dispatch::Drained) => Ok(result),
            Err(e) => Err(e),
        }
    }

    /// Non-blocking reap.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| ExitStatus::with_exit_code(status.code().unwrap_or(1) as u32)))
    }

    /// Blocking reap, for teardown.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait()?;
        Ok(ExitStatus::with_exit_code(status.code().unwrap_or(1) as u32))
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        self.close();
    }
}

fn dup_for_stdio(fd: RawFd) -> anyhow::Result<RawFd> {
    let duped = unsafe { libc::dup(fd) };
    if duped == -1 {
        bail!("dup failed: {:?}", io::Error::last_os_error());
    }
    Ok(duped)
}

fn into_raw<T: std::os::unix::io::IntoRawFd>(io: T) -> RawFd {
    io.into_raw_fd()
}
