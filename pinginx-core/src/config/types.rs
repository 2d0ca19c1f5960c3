//! Compiled routing model
//!
//! These types are produced once by the config compiler and then shared
//! read-only by every request handler.

use crate::processor::{Processor, Signal};
use crate::server::{Reply, RequestInfo};
use regex::Regex;
use std::fmt;

/// Port used by servers without a `listen` directive
pub const DEFAULT_LISTEN_PORT: u16 = 8000;

/// Name used by servers without a `server_name` directive
pub const DEFAULT_SERVER_NAME: &str = "default_server";

/// Matching tier of a location, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// `location = /path`
    Exactly,
    /// `location ^~ /path`
    Forward,
    /// `location ~ regex` or `location ~* regex`
    Regular,
    /// `location /path`
    None,
}

/// Location modifier as written in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// `=`
    Exact,
    /// `^~`
    PreferPrefix,
    /// `~`
    Regex,
    /// `~*`
    RegexCaseless,
}

impl Modifier {
    /// All modifiers, longest token first
    pub const ALL: [Modifier; 4] = [
        Modifier::PreferPrefix,
        Modifier::RegexCaseless,
        Modifier::Regex,
        Modifier::Exact,
    ];

    /// Parse a modifier token
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }

    /// The modifier as written in the configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Exact => "=",
            Modifier::PreferPrefix => "^~",
            Modifier::Regex => "~",
            Modifier::RegexCaseless => "~*",
        }
    }

    /// Matching tier selected by this modifier
    pub fn priority(self) -> Priority {
        match self {
            Modifier::Exact => Priority::Exactly,
            Modifier::PreferPrefix => Priority::Forward,
            Modifier::Regex | Modifier::RegexCaseless => Priority::Regular,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled `location` block
#[derive(Debug)]
pub struct Location {
    /// Declaration order within the server, used as the final tie-break
    pub seq: usize,
    pub priority: Priority,
    pub modifier: Option<Modifier>,
    pub path: String,
    /// Present iff `priority` is [`Priority::Regular`]
    pub pattern: Option<Regex>,
    /// Continuation processors first, then terminal ones
    pub processors: Vec<Box<dyn Processor>>,
}

impl Location {
    /// Create a location, compiling its pattern for regex modifiers.
    pub fn new(
        seq: usize,
        modifier: Option<Modifier>,
        path: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let path = path.into();
        let priority = modifier.map_or(Priority::None, Modifier::priority);

        let pattern = match modifier {
            Some(Modifier::Regex) => Some(Regex::new(&path)?),
            Some(Modifier::RegexCaseless) => Some(Regex::new(&format!("(?i){}", path))?),
            _ => None,
        };

        Ok(Self {
            seq,
            priority,
            modifier,
            path,
            pattern,
            processors: Vec::new(),
        })
    }

    /// The processor already handling `directive`, if any
    pub fn processor_mut(&mut self, directive: &str) -> Option<&mut Box<dyn Processor>> {
        self.processors.iter_mut().find(|p| p.accepts(directive))
    }

    /// Sort processors so continuation processors run before terminal ones.
    ///
    /// The sort is stable: declaration order is kept within each class.
    pub fn sort_processors(&mut self) {
        self.processors.sort_by_key(|p| p.ordering().is_terminal());
    }

    /// The request path with this location's path prefix removed
    pub fn strip_prefix<'a>(&self, request_path: &'a str) -> &'a str {
        request_path
            .strip_prefix(self.path.as_str())
            .unwrap_or(request_path)
    }

    /// Run the processor pipeline until one terminates.
    pub async fn execute(&self, reply: &mut Reply, request: &RequestInfo) -> Signal {
        for processor in &self.processors {
            if processor.execute(self, reply, request).await == Signal::Terminate {
                return Signal::Terminate;
            }
        }
        Signal::Continue
    }
}

/// A compiled `server` block (virtual host)
#[derive(Debug)]
pub struct ServerDefinition {
    pub listen_port: u16,

    /// Names from `server_name`; never empty
    pub server_names: Vec<String>,

    /// Set by `listen <port> default_server`
    pub default_server: bool,

    /// Sorted by [`ServerDefinition::sort_locations`]
    pub locations: Vec<Location>,
}

impl Default for ServerDefinition {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            server_names: vec![DEFAULT_SERVER_NAME.to_string()],
            default_server: false,
            locations: Vec::new(),
        }
    }
}

impl ServerDefinition {
    /// Primary server name
    pub fn name(&self) -> &str {
        self.server_names
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SERVER_NAME)
    }

    /// Sort locations by priority, then longest path for prefix tiers, then
    /// declaration order.
    pub fn sort_locations(&mut self) {
        self.locations.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| {
                let by_length = match a.priority {
                    Priority::Forward | Priority::None => b.path.len().cmp(&a.path.len()),
                    _ => std::cmp::Ordering::Equal,
                };
                by_length.then_with(|| a.seq.cmp(&b.seq))
            })
        });
    }
}
