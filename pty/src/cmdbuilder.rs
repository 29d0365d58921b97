//! Prepare the command and environment for the child process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Host-side variables that must never leak into the child: stale
/// geometry confuses curses apps, and TERMCAP is from another era.
const UNSET_VARS: &[&str] = &["COLUMNS", "LINES", "TERMCAP"];

/// Builder for the program spawned on the pty slave, intentionally
/// close to `std::process::Command` in feel.  On top of the caller's
/// settings it applies the terminal environment contract: a 256-color
/// TERM, UTF-8 locale defaults, and the removal of variables the child
/// must rediscover from the tty itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBuilder {
    args: Vec<OsString>,
    envs: BTreeMap<OsString, OsString>,
    unset: Vec<OsString>,
    cwd: Option<OsString>,
    login_user: Option<String>,
}

impl CommandBuilder {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        CommandBuilder {
            args: vec![program.as_ref().to_owned()],
            envs: BTreeMap::new(),
            unset: Vec::new(),
            cwd: None,
            login_user: None,
        }
    }

    /// Parse a whole command line (shell word splitting rules).
    pub fn from_shell_words(cmdline: &str) -> anyhow::Result<Self> {
        let words = shell_words::split(cmdline)?;
        if words.is_empty() {
            anyhow::bail!("empty command line");
        }
        let mut builder = CommandBuilder::new(&words[0]);
        for word in &words[1..] {
            builder.arg(word);
        }
        Ok(builder)
    }

    /// The user's default shell.
    pub fn new_default_shell() -> Self {
        CommandBuilder::new(crate::default_shell())
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    pub fn env<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.envs
            .insert(key.as_ref().to_owned(), value.as_ref().to_owned());
        self
    }

    pub fn env_remove<K: AsRef<OsStr>>(&mut self, key: K) -> &mut Self {
        self.unset.push(key.as_ref().to_owned());
        self
    }

    pub fn cwd<D: AsRef<OsStr>>(&mut self, dir: D) -> &mut Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Run as a login session for `user` (or the current user): LOGNAME,
    /// USER, SHELL and HOME come from the passwd database at spawn.
    pub fn login(&mut self, user: Option<&str>) -> &mut Self {
        self.login_user = Some(user.unwrap_or("").to_string());
        self
    }

    pub fn get_argv(&self) -> &[OsString] {
        &self.args
    }

    pub(crate) fn login_user(&self) -> Option<&str> {
        self.login_user.as_deref()
    }

    /// Materialize as a `std::process::Command` with the terminal
    /// environment applied.  Caller-provided values win over the
    /// defaults; the unset list always wins.
    pub(crate) fn as_command(&self) -> anyhow::Result<std::process::Command> {
        let mut cmd = std::process::Command::new(&self.args[0]);
        cmd.args(&self.args[1..]);

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        for var in UNSET_VARS {
            cmd.env_remove(var);
        }

        if std::env::var_os("LANG").is_none() {
            cmd.env("LANG", "en_GB.UTF-8");
        }
        if std::env::var_os("LC_CTYPE").is_none() {
            cmd.env("LC_CTYPE", "en_GB.UTF-8");
        }
        cmd.env("TERM", "xterm-256color");

        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        for key in &self.unset {
            cmd.env_remove(key);
        }

        Ok(cmd)
    }
}
