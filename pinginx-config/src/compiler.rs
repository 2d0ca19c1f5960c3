//! Compiler for nginx-style configuration
//!
//! Turns the command tree into [`ServerDefinition`]s with sorted locations
//! and sorted processor pipelines.

use crate::error::{CompileError, CompileWarning, SyntaxError, SyntaxErrorKind};
use crate::parser::{Command, ConfigBlock, parse};
use pinginx_core::config::{Location, Modifier, ServerDefinition};
use pinginx_core::{DirectiveError, Processor};
use parking_lot::Mutex;
use pinginx_plugin::ProcessorRegistry;
use tracing::{debug, warn};

type CompileResult<T> = Result<T, CompileError>;

/// Serializes compilations within the process
static COMPILE_LOCK: Mutex<()> = Mutex::new(());

/// Compiles command trees against a processor registry
pub struct Compiler<'r> {
    registry: &'r ProcessorRegistry,
    warnings: Vec<CompileWarning>,
}

impl Compiler<'static> {
    /// Compiler backed by the process-wide registry
    pub fn new() -> Self {
        Self::with_registry(ProcessorRegistry::global())
    }
}

impl Default for Compiler<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Compiler<'r> {
    pub fn with_registry(registry: &'r ProcessorRegistry) -> Self {
        Self {
            registry,
            warnings: Vec::new(),
        }
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    /// Parse and compile a source string
    pub fn compile_source(&mut self, source: &str) -> CompileResult<Vec<ServerDefinition>> {
        let block = parse(source)?;
        self.compile(&block)
    }

    /// Compile a parsed configuration into server definitions
    pub fn compile(&mut self, block: &ConfigBlock) -> CompileResult<Vec<ServerDefinition>> {
        let _guard = COMPILE_LOCK.lock();

        let mut servers = Vec::new();
        for command in top_level(block) {
            match (command.name().as_str(), &command.block) {
                ("server", Some(children)) => servers.push(self.compile_server(children)?),
                _ => self.unsupported("main", command),
            }
        }

        debug!("Compiled {} server(s)", servers.len());
        Ok(servers)
    }

    fn compile_server(&mut self, children: &[Command]) -> CompileResult<ServerDefinition> {
        let mut server = ServerDefinition::default();
        let mut names: Vec<String> = Vec::new();

        for command in children {
            match command.name().as_str() {
                "listen" => match parse_listen(command) {
                    Ok((port, default_server)) => {
                        server.listen_port = port;
                        server.default_server |= default_server;
                    }
                    Err(reason) => self.dropped(command, reason),
                },
                "server_name" => {
                    if command.params().is_empty() {
                        let reason = missing(command, 1);
                        self.dropped(command, reason);
                    } else {
                        names.extend(command.params().iter().cloned());
                    }
                }
                "location" => {
                    let seq = server.locations.len();
                    server.locations.push(self.compile_location(seq, command)?);
                }
                _ => self.unsupported("server", command),
            }
        }

        if !names.is_empty() {
            server.server_names = names;
        }
        server.sort_locations();

        debug!(
            "Server {} on port {} with {} location(s)",
            server.name(),
            server.listen_port,
            server.locations.len()
        );
        Ok(server)
    }

    fn compile_location(&mut self, seq: usize, command: &Command) -> CompileResult<Location> {
        let Some(children) = &command.block else {
            return Err(invalid_location(command, "a block is required"));
        };

        let (modifier, path) = match command.params() {
            [path] => split_attached_modifier(path),
            [modifier, path] => match Modifier::parse(modifier) {
                Some(m) => (Some(m), path.as_str()),
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnsupportedModifier(modifier.clone()),
                        command.line,
                        command.span.clone(),
                    )
                    .into());
                }
            },
            _ => return Err(invalid_location(command, "expected [modifier] path")),
        };

        let mut location =
            Location::new(seq, modifier, path).map_err(|source| CompileError::InvalidPattern {
                pattern: path.to_string(),
                line: command.line,
                span: command.span.clone(),
                source,
            })?;

        for child in children {
            self.compile_directive(&mut location, child)?;
        }
        location.sort_processors();

        Ok(location)
    }

    /// Forward one directive to the processor handling it
    fn compile_directive(
        &mut self,
        location: &mut Location,
        command: &Command,
    ) -> CompileResult<()> {
        let name = command.name();
        let path = location.path.clone();

        let result = if let Some(existing) = location.processor_mut(&name) {
            existing.parse(&path, &name, command.params())
        } else if let Some(factory) = self.registry.find(&name) {
            let mut processor: Box<dyn Processor> = factory.create();
            let result = processor.parse(&path, &name, command.params());
            if result.is_ok() {
                location.processors.push(processor);
            }
            result
        } else {
            self.unsupported("location", command);
            return Ok(());
        };

        match result {
            Ok(()) => Ok(()),
            Err(source) if source.is_fatal() => Err(CompileError::Directive {
                line: command.line,
                span: command.span.clone(),
                source,
            }),
            Err(reason) => {
                self.dropped(command, reason);
                Ok(())
            }
        }
    }

    fn unsupported(&mut self, context: &'static str, command: &Command) {
        let warning = CompileWarning::UnsupportedDirective {
            context,
            name: command.name(),
            line: command.line,
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn dropped(&mut self, command: &Command, reason: DirectiveError) {
        let warning = CompileWarning::DroppedDirective {
            name: command.name(),
            line: command.line,
            reason,
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Commands at the top level, looking through a sole `http { ... }`
fn top_level(block: &ConfigBlock) -> &[Command] {
    match block.as_slice() {
        [only] if only.name() == "http" => only.block.as_deref().unwrap_or(block),
        _ => block,
    }
}

fn missing(command: &Command, expected: usize) -> DirectiveError {
    DirectiveError::MissingParameter {
        directive: command.name(),
        expected,
    }
}

fn invalid_location(command: &Command, message: &str) -> CompileError {
    SyntaxError::new(
        SyntaxErrorKind::InvalidLocation(message.to_string()),
        command.line,
        command.span.clone(),
    )
    .into()
}

/// `location =/x` style paths carry their modifier
fn split_attached_modifier(path: &str) -> (Option<Modifier>, &str) {
    Modifier::ALL
        .into_iter()
        .find_map(|m| {
            path.strip_prefix(m.as_str())
                .filter(|rest| !rest.is_empty())
                .map(|rest| (Some(m), rest))
        })
        .unwrap_or((None, path))
}

/// `listen 8080`, `listen 127.0.0.1:8080`, `listen :8080 default_server`
fn parse_listen(command: &Command) -> Result<(u16, bool), DirectiveError> {
    let params = command.params();
    let Some(address) = params.first() else {
        return Err(missing(command, 1));
    };

    let port = address.rsplit_once(':').map_or(address.as_str(), |(_, port)| port);
    let port = port.parse::<u16>().map_err(|e| DirectiveError::InvalidValue {
        directive: command.name(),
        value: address.clone(),
        reason: e.to_string(),
    })?;

    let default_server = params[1..].iter().any(|p| p == "default_server");
    Ok((port, default_server))
}
