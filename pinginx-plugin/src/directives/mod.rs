//! Built-in location directives

mod default_type;
mod echo;
mod index;
mod proxy_pass;
mod ret;

pub use default_type::DefaultType;
pub use echo::Echo;
pub use index::Index;
pub use proxy_pass::{ProxyPass, UPSTREAM_TIMEOUT};
pub use ret::Return;

use pinginx_core::{Processor, ProcessorFactory};
use std::marker::PhantomData;

/// A processor type with a fixed set of directive names
pub trait Directive: Processor + Default + 'static {
    const NAMES: &'static [&'static str];
}

/// Factory creating default instances of a [`Directive`]
pub struct DirectiveFactory<D>(PhantomData<fn() -> D>);

impl<D: Directive> DirectiveFactory<D> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    pub fn boxed() -> Box<dyn ProcessorFactory> {
        Box::new(Self::new())
    }
}

impl<D: Directive> Default for DirectiveFactory<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Directive> ProcessorFactory for DirectiveFactory<D> {
    fn names(&self) -> &'static [&'static str] {
        D::NAMES
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(D::default())
    }
}

/// Factories for every built-in directive
pub fn builtins() -> Vec<Box<dyn ProcessorFactory>> {
    vec![
        DirectiveFactory::<Index>::boxed(),
        DirectiveFactory::<ProxyPass>::boxed(),
        DirectiveFactory::<Return>::boxed(),
        DirectiveFactory::<DefaultType>::boxed(),
        DirectiveFactory::<Echo>::boxed(),
    ]
}
