//! Location matching
//!
//! nginx picks a location in four tiers, each with its own predicate:
//!
//! | tier            | matches when                                  | winner        |
//! |-----------------|-----------------------------------------------|---------------|
//! | `= /path`       | request path equals the location path         | first         |
//! | `^~ /path`      | path equals it, or starts with it plus `/`    | longest path  |
//! | `~` / `~*`      | the pattern is found anywhere in the path     | first         |
//! | `/path`         | path starts with the location path            | longest path  |
//!
//! A tier is only consulted when every tier above it found nothing.

use crate::config::{Location, Priority, ServerDefinition};

/// Find the location serving `path`.
pub fn find_location<'a>(locations: &'a [Location], path: &str) -> Option<&'a Location> {
    find_exact(locations, path)
        .or_else(|| find_forward(locations, path))
        .or_else(|| find_regular(locations, path))
        .or_else(|| find_prefix(locations, path))
}

impl ServerDefinition {
    /// Find the location of this server serving `path`.
    pub fn find_location(&self, path: &str) -> Option<&Location> {
        find_location(&self.locations, path)
    }
}

impl Location {
    /// Whether this location's own tier predicate accepts `path`
    pub fn matches(&self, path: &str) -> bool {
        match self.priority {
            Priority::Exactly => path == self.path,
            Priority::Forward => {
                path == self.path || path.starts_with(with_trailing_slash(&self.path).as_str())
            }
            Priority::Regular => self
                .pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(path)),
            Priority::None => path.starts_with(self.path.as_str()),
        }
    }
}

fn find_exact<'a>(locations: &'a [Location], path: &str) -> Option<&'a Location> {
    in_tier(locations, Priority::Exactly).find(|l| l.matches(path))
}

fn find_forward<'a>(locations: &'a [Location], path: &str) -> Option<&'a Location> {
    longest(in_tier(locations, Priority::Forward).filter(|l| l.matches(path)))
}

fn find_regular<'a>(locations: &'a [Location], path: &str) -> Option<&'a Location> {
    in_tier(locations, Priority::Regular).find(|l| l.matches(path))
}

fn find_prefix<'a>(locations: &'a [Location], path: &str) -> Option<&'a Location> {
    longest(in_tier(locations, Priority::None).filter(|l| l.matches(path)))
}

fn in_tier(locations: &[Location], priority: Priority) -> impl Iterator<Item = &Location> {
    locations.iter().filter(move |l| l.priority == priority)
}

/// Longest path wins; the earlier location wins a tie.
fn longest<'a>(candidates: impl Iterator<Item = &'a Location>) -> Option<&'a Location> {
    candidates.fold(None, |best: Option<&Location>, l| match best {
        Some(b) if b.path.len() >= l.path.len() => Some(b),
        _ => Some(l),
    })
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
